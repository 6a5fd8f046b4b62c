use crate::error::{check_depth, check_rank};
use crate::outcome::{DealerOutcome, DealerTotal, Distribution};
use crate::{
    Decision, Error, Expectations, Hand, HouseRules, OutcomeCache, Result, Shoe,
    ShoeFingerprint,
};
use blackjack_ev_macros::Expectations;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::info;

/// Expected values of one hand, in units of the initial bet. `None` means the
/// action is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Expectations)]
pub struct ExpectedValues {
    pub stand: f64,
    pub hit: Option<f64>,
    pub double: Option<f64>,
    pub split: Option<f64>,
    pub surrender: Option<f64>,

    /// Side bet of half the initial bet, so it is not an alternative to the others.
    #[expectation(skip)]
    pub insurance: Option<f64>,
}

/// Where a hand stands in the round. Decides which actions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandContext {
    split_count: u8,
    split_aces: bool,
}

impl HandContext {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn split_count(&self) -> u8 {
        self.split_count
    }

    /// Context of each hand after splitting a pair of the given rank.
    pub fn after_split(&self, rank: u8) -> Self {
        HandContext {
            split_count: self.split_count + 1,
            split_aces: rank == 1,
        }
    }

    fn locked_after_split_aces(&self, rules: &HouseRules) -> bool {
        self.split_aces && rules.split_aces_one_card()
    }

    /// Only an Ace and a ten that were dealt together pay as a natural.
    pub fn is_natural(&self, hand: &Hand) -> bool {
        self.split_count == 0 && hand.is_natural()
    }

    pub fn can_hit(&self, rules: &HouseRules, hand: &Hand) -> bool {
        !hand.bust() && !self.locked_after_split_aces(rules)
    }

    pub fn can_double(&self, rules: &HouseRules, hand: &Hand) -> bool {
        hand.get_total() == 2
            && rules.double_down()
            && (self.split_count == 0 || rules.double_after_split())
            && !self.locked_after_split_aces(rules)
    }

    pub fn can_split(&self, rules: &HouseRules, hand: &Hand) -> bool {
        let rank = match hand.pair_rank() {
            Some(rank) => rank,
            None => return false,
        };
        let aces_allowed = rank != 1 || self.split_count == 0 || rules.resplit_aces();
        let below_split_limit = rules
            .max_split_count()
            .map_or(true, |limit| self.split_count < limit);
        let below_hand_limit = self.split_count + 1 < rules.max_hands();
        aces_allowed && below_split_limit && below_hand_limit
    }

    pub fn can_surrender(&self, rules: &HouseRules, hand: &Hand) -> bool {
        rules.late_surrender() && self.split_count == 0 && hand.get_total() == 2
    }

    pub fn can_insure(&self, rules: &HouseRules, hand: &Hand, dealer_up_card: u8) -> bool {
        rules.insurance() && dealer_up_card == 1 && self.split_count == 0 && hand.get_total() == 2
    }
}

/// A calculation session: one rule set, one recursion depth and the outcome
/// cache shared by every hand computed through it.
#[derive(Debug)]
pub struct Calculator {
    rules: HouseRules,
    depth: usize,
    cache: OutcomeCache,
}

impl Calculator {
    pub fn new(rules: HouseRules, recursion_depth: i32) -> Result<Self> {
        Ok(Calculator {
            depth: check_depth(recursion_depth)?,
            cache: OutcomeCache::for_rules(&rules),
            rules,
        })
    }

    pub fn rules(&self) -> &HouseRules {
        &self.rules
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cache(&self) -> &OutcomeCache {
        &self.cache
    }

    /// Expected values of a freshly dealt hand. The player's cards and the up
    /// card are removed from a full shoe first.
    pub fn compute_ev(&self, player_cards: &[u8], dealer_up_card: u8) -> Result<ExpectedValues> {
        let dealer_up_card = check_rank(dealer_up_card)?;
        let hand = Hand::from_cards(player_cards)?;
        let shoe = Shoe::factory(&self.rules)
            .draw_all(player_cards)?
            .draw(dealer_up_card)?;
        self.compute_ev_in_context(&hand, dealer_up_card, &shoe, HandContext::new())
    }

    /// Expected values of a hand drawing from `shoe`, which must already exclude
    /// the player's cards and the dealer's up card.
    pub fn compute_ev_with_shoe(
        &self,
        player_cards: &[u8],
        dealer_up_card: u8,
        shoe: &Shoe,
    ) -> Result<ExpectedValues> {
        let hand = Hand::from_cards(player_cards)?;
        self.compute_ev_in_context(&hand, check_rank(dealer_up_card)?, shoe, HandContext::new())
    }

    pub fn compute_ev_in_context(
        &self,
        hand: &Hand,
        dealer_up_card: u8,
        shoe: &Shoe,
        context: HandContext,
    ) -> Result<ExpectedValues> {
        if hand.get_total() < 2 {
            return Err(Error::InvalidCard(String::from(
                "a hand needs at least two cards",
            )));
        }
        let dealer_up_card = check_rank(dealer_up_card)?;
        let mut evaluator = HandEvaluator::new(self, dealer_up_card);
        let ex = evaluator.evaluate(hand, shoe, context)?;
        info!(
            cards = ?hand.cards(),
            dealer_up_card,
            depth = self.depth,
            player_states = evaluator.after_hit.len(),
            dealer_tables = self.cache.computed_tables(),
            "computed expected values"
        );
        Ok(ex)
    }

    /// Distribution of the dealer's final hand given the up card, with the
    /// hole card still to come from `shoe`.
    ///
    /// When the dealer peeks on this up card the hole card cannot complete a
    /// natural, so the distribution has no Blackjack mass and everything derived
    /// from it is conditional on the dealer not holding one.
    pub fn dealer_distribution(&self, dealer_up_card: u8, shoe: &Shoe) -> Result<Distribution> {
        let dealer_up_card = check_rank(dealer_up_card)?;
        let start = DealerTotal::hard(0).after(dealer_up_card);
        let blackjack_card = match dealer_up_card {
            1 => 10,
            10 => 1,
            _ => return self.cache.lookup(shoe, self.depth, start),
        };

        let p = shoe.probabilities()?;
        let peeks = self.rules.peek_policy().peeks(dealer_up_card);
        let p_blackjack = p[blackjack_card];
        if peeks && p_blackjack >= 1.0 {
            // Nothing else left to condition on.
            return Ok(Distribution::unit(DealerOutcome::Blackjack));
        }
        let scale = if peeks { 1.0 / (1.0 - p_blackjack) } else { 1.0 };

        let mut distribution = Distribution::default();
        for (hole_card, p_hole_card) in p.iter() {
            if p_hole_card == 0.0 {
                continue;
            }
            if hole_card == blackjack_card {
                if !peeks {
                    distribution[DealerOutcome::Blackjack] += p_hole_card;
                }
                continue;
            }
            let state = start.after(hole_card);
            let next = match self.depth {
                0 => self.cache.lookup(shoe, 0, state)?,
                depth => self.cache.lookup(&shoe.draw(hole_card)?, depth - 1, state)?,
            };
            distribution.add_assign_with_p(&next, p_hole_card * scale);
        }
        Ok(distribution)
    }
}

/// Expected values of a hand under the given rules, starting from a full shoe.
pub fn compute_ev(
    player_cards: &[u8],
    dealer_up_card: u8,
    rules: &HouseRules,
    recursion_depth: i32,
) -> Result<ExpectedValues> {
    Calculator::new(*rules, recursion_depth)?.compute_ev(player_cards, dealer_up_card)
}

type StateKey = (ShoeFingerprint, Hand, HandContext);

/// Player side recursion for one dealer up card. Card removal is exact: every
/// player card drawn yields a new shoe.
struct HandEvaluator<'a> {
    calculator: &'a Calculator,
    dealer_up_card: u8,

    dealer: HashMap<ShoeFingerprint, Distribution>,
    after_hit: HashMap<StateKey, f64>,
    best: HashMap<StateKey, f64>,
}

impl<'a> HandEvaluator<'a> {
    fn new(calculator: &'a Calculator, dealer_up_card: u8) -> Self {
        HandEvaluator {
            calculator,
            dealer_up_card,
            dealer: HashMap::new(),
            after_hit: HashMap::new(),
            best: HashMap::new(),
        }
    }

    fn rules(&self) -> &'a HouseRules {
        &self.calculator.rules
    }

    fn evaluate(&mut self, hand: &Hand, shoe: &Shoe, context: HandContext) -> Result<ExpectedValues> {
        let rules = self.rules();
        let stand = self.stand(hand, shoe, context)?;
        let hit = match context.can_hit(rules, hand) {
            true => Some(self.hit(hand, shoe, context)?),
            false => None,
        };
        let double = match context.can_double(rules, hand) {
            true => Some(self.double(hand, shoe, context)?),
            false => None,
        };
        let split = match (context.can_split(rules, hand), hand.pair_rank()) {
            (true, Some(rank)) => Some(self.split(rank, shoe, context)?),
            _ => None,
        };
        let surrender = match context.can_surrender(rules, hand) {
            true => Some(-0.5 - 0.5 * self.dealer(shoe)?[DealerOutcome::Blackjack]),
            false => None,
        };
        let insurance = match context.can_insure(rules, hand, self.dealer_up_card) {
            // Half a bet paying 2:1 on a ten in the hole.
            true => {
                let p_ten = shoe.probabilities()?[10];
                Some(0.5 * (2.0 * p_ten - (1.0 - p_ten)))
            }
            false => None,
        };

        Ok(ExpectedValues {
            stand,
            hit,
            double,
            split,
            surrender,
            insurance,
        })
    }

    fn dealer(&mut self, shoe: &Shoe) -> Result<Distribution> {
        if let Some(distribution) = self.dealer.get(&shoe.fingerprint()) {
            return Ok(*distribution);
        }
        let distribution = self
            .calculator
            .dealer_distribution(self.dealer_up_card, shoe)?;
        self.dealer.insert(shoe.fingerprint(), distribution);
        Ok(distribution)
    }

    fn stand(&mut self, hand: &Hand, shoe: &Shoe, context: HandContext) -> Result<f64> {
        if hand.bust() {
            return Ok(-1.0);
        }
        let distribution = self.dealer(shoe)?;
        let natural = context.is_natural(hand);
        let payout_blackjack = self.rules().blackjack_payout();
        let player_sum = hand.get_actual_sum();

        let mut ex = 0.0;
        for (outcome, p) in distribution.iter() {
            if p == 0.0 {
                continue;
            }
            let result = match (outcome, natural) {
                (DealerOutcome::Blackjack, true) => 0.0,
                (DealerOutcome::Blackjack, false) => -1.0,
                (_, true) => payout_blackjack,
                (DealerOutcome::Bust, false) => 1.0,
                (made, false) => match made.total().map(|total| player_sum.cmp(&total)) {
                    Some(Ordering::Greater) => 1.0,
                    Some(Ordering::Equal) => 0.0,
                    _ => -1.0,
                },
            };
            ex += p * result;
        }
        Ok(ex)
    }

    fn hit(&mut self, hand: &Hand, shoe: &Shoe, context: HandContext) -> Result<f64> {
        let p = shoe.probabilities()?;
        let mut ex = 0.0;
        for (card, p_card) in p.iter() {
            if p_card == 0.0 {
                continue;
            }
            let next_shoe = shoe.draw(card)?;
            ex += p_card * self.play_after_hit(&hand.with_card(card), &next_shoe, context)?;
        }
        Ok(ex)
    }

    /// Best of stand and hit once the hand has taken a card.
    fn play_after_hit(&mut self, hand: &Hand, shoe: &Shoe, context: HandContext) -> Result<f64> {
        if hand.bust() {
            return Ok(-1.0);
        }
        let key = (shoe.fingerprint(), *hand, context);
        if let Some(ex) = self.after_hit.get(&key) {
            return Ok(*ex);
        }

        let stand = self.stand(hand, shoe, context)?;
        let ex = if hand.get_actual_sum() == 21 {
            stand
        } else {
            stand.max(self.hit(hand, shoe, context)?)
        };
        self.after_hit.insert(key, ex);
        Ok(ex)
    }

    fn double(&mut self, hand: &Hand, shoe: &Shoe, context: HandContext) -> Result<f64> {
        let p = shoe.probabilities()?;
        let mut ex = 0.0;
        for (card, p_card) in p.iter() {
            if p_card == 0.0 {
                continue;
            }
            let next_shoe = shoe.draw(card)?;
            ex += p_card * self.stand(&hand.with_card(card), &next_shoe, context)?;
        }
        Ok(2.0 * ex)
    }

    /// Both hands are played out on their own, each from the shoe as it is at
    /// the moment of splitting.
    fn split(&mut self, rank: u8, shoe: &Shoe, context: HandContext) -> Result<f64> {
        let context = context.after_split(rank);
        Ok(2.0 * self.split_hand(rank, shoe, context)?)
    }

    fn split_hand(&mut self, rank: u8, shoe: &Shoe, context: HandContext) -> Result<f64> {
        let p = shoe.probabilities()?;
        let first_card = Hand::new().with_card(rank);
        let mut ex = 0.0;
        for (card, p_card) in p.iter() {
            if p_card == 0.0 {
                continue;
            }
            let next_shoe = shoe.draw(card)?;
            ex += p_card * self.best(&first_card.with_card(card), &next_shoe, context)?;
        }
        Ok(ex)
    }

    fn best(&mut self, hand: &Hand, shoe: &Shoe, context: HandContext) -> Result<f64> {
        let key = (shoe.fingerprint(), *hand, context);
        if let Some(ex) = self.best.get(&key) {
            return Ok(*ex);
        }
        let ex = match self.evaluate(hand, shoe, context)?.best() {
            Some((_, ex)) => ex,
            None => self.stand(hand, shoe, context)?,
        };
        self.best.insert(key, ex);
        Ok(ex)
    }
}
