use crate::cache::OutcomeCache;
use crate::outcome::{DealerTotal, Distribution, OutcomeTable};
use crate::{Result, Shoe};
use std::sync::Arc;

/// Non-terminal totals in an order where every total comes after the totals it
/// can reach: hard 16 down to 11, then the soft totals, then hard 10 down to 2
/// (which may reach soft totals through an Ace).
fn induction_order(dealer_hits_soft17: bool) -> impl Iterator<Item = DealerTotal> {
    let highest_soft = if dealer_hits_soft17 { 17 } else { 16 };
    (11..=16)
        .rev()
        .map(DealerTotal::hard)
        .chain((11..=highest_soft).rev().map(DealerTotal::soft))
        .chain((2..=10).rev().map(DealerTotal::hard))
}

/// Tables of the shoes one card smaller, at one less depth.
struct Children {
    tables: [Option<Arc<OutcomeTable>>; 10],
}

impl Children {
    fn new(cache: &OutcomeCache, shoe: &Shoe, depth: usize) -> Result<Self> {
        let mut tables: [Option<Arc<OutcomeTable>>; 10] = Default::default();
        for rank in 1..=10 {
            if shoe[rank] == 0 {
                continue;
            }
            let child = shoe.draw(rank)?;
            if child.is_empty() {
                continue;
            }
            tables[(rank - 1) as usize] = Some(cache.table(&child, depth)?);
        }
        Ok(Children { tables })
    }

    /// The child's distribution from `state`, if the dealer can finish from it.
    fn get(&self, rank: u8, state: DealerTotal) -> Option<Distribution> {
        let distribution = self.tables[(rank - 1) as usize].as_ref()?[state];
        distribution.is_computed().then_some(distribution)
    }
}

/// Fills the outcome table of `shoe`.
///
/// The distribution of a total is the sum over the next card of its
/// probability times the distribution of the resulting total. With `depth`
/// left, the resulting total is read from the table of the shoe without that
/// card (through the cache). At depth 0 the current shoe's probabilities are
/// reused for every later card.
///
/// A cell whose dealer may have to draw from an exhausted shoe is left
/// uncomputed (all zeros). Whether that matters is up to the reader of the
/// cell: most such totals are never reached from the requested one.
pub(crate) fn solve(cache: &OutcomeCache, shoe: &Shoe, depth: usize) -> Result<OutcomeTable> {
    let p = shoe.probabilities()?;
    let dealer_hits_soft17 = cache.dealer_hits_soft17();
    let mut table = OutcomeTable::with_terminal_rows(dealer_hits_soft17);
    let children = match depth {
        0 => None,
        _ => Some(Children::new(cache, shoe, depth - 1)?),
    };

    'states: for state in induction_order(dealer_hits_soft17) {
        let mut distribution = Distribution::default();
        for (rank, p_rank) in p.iter() {
            if p_rank == 0.0 {
                continue;
            }
            let next = state.after(rank);
            let next_distribution = match next.terminal(dealer_hits_soft17) {
                Some(terminal) => terminal,
                None => match &children {
                    Some(children) => match children.get(rank, next) {
                        Some(next_distribution) => next_distribution,
                        None => continue 'states,
                    },
                    None => {
                        debug_assert!(table[next].is_computed(), "{:?} -> {:?}", state, next);
                        table[next]
                    }
                },
            };
            distribution.add_assign_with_p(&next_distribution, p_rank);
        }
        debug_assert!(
            distribution.is_normalized(),
            "distribution of {:?} sums to {}",
            state,
            distribution.total()
        );
        table[state] = distribution;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{DealerOutcome, EPSILON};
    use crate::Error;
    use rand::Rng;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPSILON, "{} != {}", a, b);
    }

    fn all_states() -> impl Iterator<Item = DealerTotal> {
        (2..=31)
            .map(DealerTotal::hard)
            .chain((11..=21).map(DealerTotal::soft))
    }

    #[test]
    fn every_cell_is_normalized() {
        let mut rng = rand::thread_rng();
        for dealer_hits_soft17 in [false, true] {
            for _turn in 0..5 {
                let mut counts = [0; 10];
                for count in counts.iter_mut() {
                    *count = rng.gen_range(2..=8);
                }
                let shoe = Shoe::new(&counts).unwrap();
                let cache = OutcomeCache::new(dealer_hits_soft17);
                for depth in 0..=2 {
                    let table = cache.table(&shoe, depth).unwrap();
                    for state in all_states() {
                        assert!(table[state].is_normalized(), "{:?}", state);
                        assert_eq!(table[state][DealerOutcome::Blackjack], 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn shoe_of_tens_only() {
        let cache = OutcomeCache::new(false);
        let shoe = Shoe::new(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 20]).unwrap();
        let table = cache.table(&shoe, 0).unwrap();
        assert_eq!(*table.hard(7), Distribution::unit(DealerOutcome::H17));
        assert_eq!(*table.hard(11), Distribution::unit(DealerOutcome::H21));
        assert_eq!(*table.hard(12), Distribution::unit(DealerOutcome::Bust));
        assert_eq!(*table.hard(2), Distribution::unit(DealerOutcome::Bust));
        assert_eq!(*table.soft(11), Distribution::unit(DealerOutcome::H21));
        assert_eq!(*table.soft(13), Distribution::unit(DealerOutcome::Bust));
    }

    #[test]
    fn card_removal_changes_the_outcome() {
        let cache = OutcomeCache::new(false);
        let shoe = Shoe::new(&[0, 0, 0, 0, 0, 1, 0, 0, 0, 1]).unwrap();

        // Fixed shoe: each draw is a ten or a six with even odds.
        let fixed = cache.table(&shoe, 0).unwrap();
        assert_close(fixed.hard(12)[DealerOutcome::Bust], 0.5);
        assert_close(fixed.hard(12)[DealerOutcome::H18], 0.5);
        assert_close(fixed.hard(6)[DealerOutcome::Bust], 0.75);
        assert_close(fixed.hard(6)[DealerOutcome::H18], 0.25);

        // Exact: after a ten only the six is left and vice versa, so 6 always busts.
        let exact = cache.table(&shoe, 1).unwrap();
        assert_close(exact.hard(12)[DealerOutcome::Bust], 0.5);
        assert_eq!(*exact.hard(6), Distribution::unit(DealerOutcome::Bust));
    }

    #[test]
    fn soft17_rule() {
        let shoe = Shoe::with_number_of_decks(8);
        let s17 = OutcomeCache::new(false).table(&shoe, 0).unwrap();
        let h17 = OutcomeCache::new(true).table(&shoe, 0).unwrap();
        assert_eq!(*s17.soft(17), Distribution::unit(DealerOutcome::H17));
        assert!(h17.soft(17)[DealerOutcome::H17] < 1.0);
        assert!(h17.soft(17)[DealerOutcome::H18] > 0.0);
        // Hitting soft 17 makes the dealer bust more often from a 6.
        assert!(h17.hard(6)[DealerOutcome::Bust] > s17.hard(6)[DealerOutcome::Bust]);
    }

    #[test]
    fn dealer_six_busts_about_forty_two_percent() {
        let cache = OutcomeCache::new(false);
        let shoe = Shoe::with_number_of_decks(8);
        let bust = cache.table(&shoe, 0).unwrap().hard(6)[DealerOutcome::Bust];
        assert!(bust > 0.41 && bust < 0.43, "{}", bust);
    }

    #[test]
    fn should_fail_when_dealer_runs_out_of_cards() {
        let cache = OutcomeCache::new(false);
        let shoe = Shoe::new(&[0, 0, 0, 0, 1, 0, 0, 0, 0, 0]).unwrap();
        // Fixed shoe: fine, fives forever.
        assert_eq!(
            *cache.table(&shoe, 0).unwrap().hard(2),
            Distribution::unit(DealerOutcome::H17)
        );
        // Exact: after the only five the dealer still has to hit.
        let table = cache.table(&shoe, 1).unwrap();
        assert!(!table.hard(2).is_computed());
        assert_eq!(
            cache.lookup(&shoe, 1, DealerTotal::hard(2)),
            Err(Error::EmptyShoe)
        );
        // 12 + 5 stands without needing another card.
        assert_eq!(
            cache.lookup(&shoe, 1, DealerTotal::hard(12)).unwrap(),
            Distribution::unit(DealerOutcome::H17)
        );
    }

    #[test]
    fn unreachable_exhausted_totals_do_not_fail_deeper_tables() {
        let shoe = Shoe::new(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 3]).unwrap();
        for depth in 0..=3 {
            let cache = OutcomeCache::new(false);
            // 5, then two tens: always a bust, whatever the depth.
            assert_eq!(
                cache.lookup(&shoe, depth, DealerTotal::hard(5)).unwrap(),
                Distribution::unit(DealerOutcome::Bust),
                "depth {}",
                depth
            );
        }

        // With one ten left, hard 2 would need a card after 12.
        let one_ten = Shoe::new(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 1]).unwrap();
        let cache = OutcomeCache::new(false);
        assert_eq!(
            cache.lookup(&one_ten, 1, DealerTotal::hard(2)),
            Err(Error::EmptyShoe)
        );
        assert_eq!(
            cache.lookup(&one_ten, 1, DealerTotal::hard(12)).unwrap(),
            Distribution::unit(DealerOutcome::Bust)
        );
    }

    #[test]
    fn induction_order_covers_all_non_terminal_totals() {
        for dealer_hits_soft17 in [false, true] {
            let order: Vec<_> = induction_order(dealer_hits_soft17).collect();
            let expected = all_states()
                .filter(|state| state.terminal(dealer_hits_soft17).is_none())
                .count();
            assert_eq!(order.len(), expected);
        }
    }
}
