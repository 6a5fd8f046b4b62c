use std::ops::{self, Index, IndexMut};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};

/// Float drift allowed on a distribution's total mass.
pub const EPSILON: f64 = 1e-9;

/// Highest running total a dealer can reach: hard 21 plus a ten.
pub const MAX_TOTAL: u8 = 31;
const TABLE_LEN: usize = MAX_TOTAL as usize + 1;

/// Final state of the dealer's hand. Ordered for comparison against the
/// player: a bust loses to everything, a natural beats everything.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCountMacro,
)]
pub enum DealerOutcome {
    Bust = 0,
    H17,
    H18,
    H19,
    H20,
    H21,
    Blackjack,
}

impl DealerOutcome {
    /// The outcome of a dealer standing on `total`, which must be in [17, 21].
    pub(crate) fn standing_on(total: u8) -> DealerOutcome {
        match total {
            17 => DealerOutcome::H17,
            18 => DealerOutcome::H18,
            19 => DealerOutcome::H19,
            20 => DealerOutcome::H20,
            21 => DealerOutcome::H21,
            _ => panic!("Dealer cannot stand on {}", total),
        }
    }

    /// The made total, or None for Bust and Blackjack.
    pub fn total(&self) -> Option<u16> {
        match self {
            DealerOutcome::H17 => Some(17),
            DealerOutcome::H18 => Some(18),
            DealerOutcome::H19 => Some(19),
            DealerOutcome::H20 => Some(20),
            DealerOutcome::H21 => Some(21),
            _ => None,
        }
    }
}

/// Probability of each [`DealerOutcome`]. All zeros means "not computed yet".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Distribution([f64; DealerOutcome::COUNT]);

impl Distribution {
    pub fn unit(outcome: DealerOutcome) -> Self {
        let mut distribution = Self::default();
        distribution[outcome] = 1.0;
        distribution
    }

    pub fn is_computed(&self) -> bool {
        self.0.iter().any(|p| *p != 0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= EPSILON
    }

    pub fn iter(&self) -> impl Iterator<Item = (DealerOutcome, f64)> + '_ {
        DealerOutcome::iter().map(|outcome| (outcome, self[outcome]))
    }

    pub fn add_assign_with_p(&mut self, rhs: &Self, p: f64) {
        for i in 0..self.0.len() {
            self.0[i] += rhs.0[i] * p;
        }
    }
}

impl Index<DealerOutcome> for Distribution {
    type Output = f64;
    fn index(&self, outcome: DealerOutcome) -> &Self::Output {
        &self.0[outcome as usize]
    }
}

impl IndexMut<DealerOutcome> for Distribution {
    fn index_mut(&mut self, outcome: DealerOutcome) -> &mut Self::Output {
        &mut self.0[outcome as usize]
    }
}

impl ops::AddAssign<&Distribution> for Distribution {
    fn add_assign(&mut self, rhs: &Distribution) {
        self.add_assign_with_p(rhs, 1.0);
    }
}

impl ops::Mul<f64> for Distribution {
    type Output = Distribution;
    fn mul(mut self, rhs: f64) -> Self::Output {
        for p in self.0.iter_mut() {
            *p *= rhs;
        }
        self
    }
}

/// A dealer running total. Soft totals count one Ace as 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DealerTotal {
    pub total: u8,
    pub is_soft: bool,
}

impl DealerTotal {
    /// A soft total above 21 is the hard total ten lower.
    pub fn new(total: u8, is_soft: bool) -> Self {
        if is_soft && total > 21 {
            DealerTotal {
                total: total - 10,
                is_soft: false,
            }
        } else {
            DealerTotal { total, is_soft }
        }
    }

    pub fn hard(total: u8) -> Self {
        Self::new(total, false)
    }

    pub fn soft(total: u8) -> Self {
        Self::new(total, true)
    }

    /// The total after the dealer takes a card of the given rank.
    pub fn after(&self, rank: u8) -> Self {
        if rank == 1 && !self.is_soft && self.total <= 10 {
            Self::soft(self.total + 11)
        } else {
            Self::new(self.total + rank, self.is_soft)
        }
    }

    /// The distribution of a total the dealer no longer draws on, if it is one.
    pub fn terminal(&self, dealer_hits_soft17: bool) -> Option<Distribution> {
        let stands_at = if self.is_soft && dealer_hits_soft17 {
            18
        } else {
            17
        };
        match self.total {
            t if t > 21 => Some(Distribution::unit(DealerOutcome::Bust)),
            t if t >= stands_at => Some(Distribution::unit(DealerOutcome::standing_on(t))),
            _ => None,
        }
    }
}

/// Dealer outcome distributions for every running total, for one shoe.
#[derive(Debug, Clone)]
pub struct OutcomeTable {
    hard: [Distribution; TABLE_LEN],
    soft: [Distribution; TABLE_LEN],
}

impl Default for OutcomeTable {
    fn default() -> Self {
        OutcomeTable {
            hard: [Distribution::default(); TABLE_LEN],
            soft: [Distribution::default(); TABLE_LEN],
        }
    }
}

impl OutcomeTable {
    /// A table with only the terminal rows filled. These rows are the same for
    /// every shoe.
    pub fn with_terminal_rows(dealer_hits_soft17: bool) -> Self {
        let mut table = Self::default();
        for total in 2..=MAX_TOTAL {
            let state = DealerTotal::hard(total);
            if let Some(distribution) = state.terminal(dealer_hits_soft17) {
                table[state] = distribution;
            }
        }
        for total in 11..=21 {
            let state = DealerTotal::soft(total);
            if let Some(distribution) = state.terminal(dealer_hits_soft17) {
                table[state] = distribution;
            }
        }
        table
    }

    pub fn hard(&self, total: u8) -> &Distribution {
        &self[DealerTotal::hard(total)]
    }

    pub fn soft(&self, total: u8) -> &Distribution {
        &self[DealerTotal::soft(total)]
    }
}

impl Index<DealerTotal> for OutcomeTable {
    type Output = Distribution;
    fn index(&self, state: DealerTotal) -> &Self::Output {
        let state = DealerTotal::new(state.total, state.is_soft);
        if state.is_soft {
            &self.soft[state.total as usize]
        } else {
            &self.hard[state.total as usize]
        }
    }
}

impl IndexMut<DealerTotal> for OutcomeTable {
    fn index_mut(&mut self, state: DealerTotal) -> &mut Self::Output {
        let state = DealerTotal::new(state.total, state.is_soft);
        if state.is_soft {
            &mut self.soft[state.total as usize]
        } else {
            &mut self.hard[state.total as usize]
        }
    }
}
