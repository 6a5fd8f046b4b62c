pub mod cache;
pub mod calculation;
mod error;
mod hand;
pub mod outcome;
mod rules;
mod shoe;
mod solver;
pub mod strategy;

pub use cache::OutcomeCache;
pub use calculation::{compute_ev, Calculator, ExpectedValues, HandContext};
pub use error::{Error, Result};
pub use hand::Hand;
pub use outcome::{DealerOutcome, Distribution, OutcomeTable};
pub use rules::{HouseRules, HouseRulesBuilder, PeekPolicy};
pub use shoe::{ProbabilityVector, Shoe, ShoeFingerprint, MAX_RANK_COUNT};
pub use strategy::{StrategyCell, StrategyRow, StrategyTable, TableRow};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
}

impl Decision {
    /// The letter used in strategy charts.
    pub fn to_char(&self) -> char {
        match self {
            Decision::Hit => 'H',
            Decision::Stand => 'S',
            Decision::Double => 'D',
            Decision::Split => 'P',
            Decision::Surrender => 'R',
        }
    }
}

/// Expected values of the actions available to a hand. Implement it with
/// `#[derive(Expectations)]`.
pub trait Expectations {
    /// Every available action with its expected value.
    fn expectations(&self) -> Vec<(Decision, f64)>;

    /// The action with the highest expected value. The earlier action wins a tie.
    fn best(&self) -> Option<(Decision, f64)> {
        let mut best: Option<(Decision, f64)> = None;
        for (decision, ex) in self.expectations() {
            match best {
                Some((_, max_ex)) if max_ex >= ex => {}
                _ => best = Some((decision, ex)),
            }
        }
        best
    }
}
