use crate::{Error, Result};
use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use std::fmt;

/// When the dealer checks the hole card for a natural Blackjack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_enum_str, Deserialize_enum_str)]
pub enum PeekPolicy {
    UpAceOrTen,
    UpAce,
    NoPeek,
}

impl PeekPolicy {
    /// Whether the dealer peeks when showing the given up card.
    pub fn peeks(&self, dealer_up_card: u8) -> bool {
        match self {
            PeekPolicy::UpAceOrTen => dealer_up_card == 1 || dealer_up_card == 10,
            PeekPolicy::UpAce => dealer_up_card == 1,
            PeekPolicy::NoPeek => false,
        }
    }
}

/// Table rules. Only constructible through [`HouseRulesBuilder`], which
/// validates every field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseRules {
    shoe_size: u8,
    s17: bool,
    blackjack_payout: f64,
    max_hands: u8,
    double_down: bool,
    double_after_split: bool,
    resplit_aces: bool,
    max_split_count: Option<u8>,
    insurance: bool,
    late_surrender: bool,
    peek_policy: PeekPolicy,
    split_aces_one_card: bool,
}

impl Default for HouseRules {
    fn default() -> Self {
        HouseRules {
            shoe_size: 8,
            s17: true,
            blackjack_payout: 1.5,
            max_hands: 4,
            double_down: true,
            double_after_split: true,
            resplit_aces: false,
            max_split_count: None,
            insurance: true,
            late_surrender: true,
            peek_policy: PeekPolicy::NoPeek,
            split_aces_one_card: true,
        }
    }
}

impl HouseRules {
    pub fn builder() -> HouseRulesBuilder {
        HouseRulesBuilder {
            rules: HouseRules::default(),
        }
    }

    /// Number of decks in the shoe. One of 4, 6 or 8.
    pub fn shoe_size(&self) -> u8 {
        self.shoe_size
    }

    /// Whether the dealer stands on a soft 17.
    pub fn s17(&self) -> bool {
        self.s17
    }

    pub fn dealer_hits_soft17(&self) -> bool {
        !self.s17
    }

    /// Payout for a natural Blackjack, e.g. 1.5 for 3:2.
    pub fn blackjack_payout(&self) -> f64 {
        self.blackjack_payout
    }

    /// Maximum number of hands a player can hold after splitting.
    pub fn max_hands(&self) -> u8 {
        self.max_hands
    }

    pub fn double_down(&self) -> bool {
        self.double_down
    }

    pub fn double_after_split(&self) -> bool {
        self.double_after_split
    }

    pub fn resplit_aces(&self) -> bool {
        self.resplit_aces
    }

    pub fn max_split_count(&self) -> Option<u8> {
        self.max_split_count
    }

    pub fn insurance(&self) -> bool {
        self.insurance
    }

    pub fn late_surrender(&self) -> bool {
        self.late_surrender
    }

    pub fn peek_policy(&self) -> PeekPolicy {
        self.peek_policy
    }

    /// Split aces receive exactly one card each and take no further action.
    pub fn split_aces_one_card(&self) -> bool {
        self.split_aces_one_card
    }
}

impl fmt::Display for HouseRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} decks, {}, {}x BJ",
            self.shoe_size,
            if self.s17 { "S17" } else { "H17" },
            self.blackjack_payout
        )?;
        if self.double_after_split {
            write!(f, ", DAS")?;
        }
        if self.resplit_aces {
            write!(f, ", RSA")?;
        }
        if self.late_surrender {
            write!(f, ", LS")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HouseRulesBuilder {
    rules: HouseRules,
}

impl HouseRulesBuilder {
    pub fn shoe_size(mut self, shoe_size: u8) -> Self {
        self.rules.shoe_size = shoe_size;
        self
    }

    pub fn s17(mut self, s17: bool) -> Self {
        self.rules.s17 = s17;
        self
    }

    pub fn blackjack_payout(mut self, payout: f64) -> Self {
        self.rules.blackjack_payout = payout;
        self
    }

    pub fn max_hands(mut self, max_hands: u8) -> Self {
        self.rules.max_hands = max_hands;
        self
    }

    pub fn double_down(mut self, allowed: bool) -> Self {
        self.rules.double_down = allowed;
        self
    }

    pub fn double_after_split(mut self, allowed: bool) -> Self {
        self.rules.double_after_split = allowed;
        self
    }

    pub fn resplit_aces(mut self, allowed: bool) -> Self {
        self.rules.resplit_aces = allowed;
        self
    }

    pub fn max_split_count(mut self, limit: Option<u8>) -> Self {
        self.rules.max_split_count = limit;
        self
    }

    pub fn insurance(mut self, allowed: bool) -> Self {
        self.rules.insurance = allowed;
        self
    }

    pub fn late_surrender(mut self, allowed: bool) -> Self {
        self.rules.late_surrender = allowed;
        self
    }

    pub fn peek_policy(mut self, policy: PeekPolicy) -> Self {
        self.rules.peek_policy = policy;
        self
    }

    pub fn split_aces_one_card(mut self, one_card: bool) -> Self {
        self.rules.split_aces_one_card = one_card;
        self
    }

    pub fn build(self) -> Result<HouseRules> {
        let rules = self.rules;
        if ![4, 6, 8].contains(&rules.shoe_size) {
            return Err(Error::invalid_rule(
                "shoe_size",
                format!("must be 4, 6 or 8, got {}", rules.shoe_size),
            ));
        }
        if !rules.blackjack_payout.is_finite() || rules.blackjack_payout <= 1.0 {
            return Err(Error::invalid_rule(
                "blackjack_payout",
                format!("must be greater than 1, got {}", rules.blackjack_payout),
            ));
        }
        if !(2..=4).contains(&rules.max_hands) {
            return Err(Error::invalid_rule(
                "max_hands",
                format!("must be 2, 3 or 4, got {}", rules.max_hands),
            ));
        }
        if rules.resplit_aces && rules.max_hands == 2 {
            return Err(Error::invalid_rule(
                "resplit_aces",
                "max_hands must be greater than 2 if re-splitting aces is allowed",
            ));
        }
        if rules.max_split_count == Some(0) {
            return Err(Error::invalid_rule(
                "max_split_count",
                "must be at least 1 when set",
            ));
        }
        Ok(rules)
    }
}
