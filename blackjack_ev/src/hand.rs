use crate::{error::check_rank, Result};

/// Cards held by the player, kept as counts per rank like [`crate::Shoe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hand {
    counts: [u8; 10],
    sum: u16,
    total: u8,
}

impl Hand {
    pub fn new() -> Hand {
        Default::default()
    }

    pub fn from_cards(cards: &[u8]) -> Result<Hand> {
        let mut hand = Hand::new();
        for card in cards {
            hand = hand.with_card(check_rank(*card)?);
        }
        Ok(hand)
    }

    /// Returns this hand plus a card of the given value.
    ///
    /// Note that this method won't check if the card value is valid.
    pub fn with_card(&self, card_value: u8) -> Hand {
        let mut hand = *self;
        hand.counts[(card_value - 1) as usize] += 1;
        hand.sum += card_value as u16;
        hand.total += 1;
        hand
    }

    /// Note that this method treats Ace as 1.
    pub fn get_sum(&self) -> u16 {
        self.sum
    }

    pub fn get_total(&self) -> u8 {
        self.total
    }

    pub fn has_ace(&self) -> bool {
        self.counts[0] > 0
    }

    /// Soft means an Ace is currently counted as 11.
    pub fn is_soft(&self) -> bool {
        self.has_ace() && self.sum + 10 <= 21
    }

    pub fn bust(&self) -> bool {
        self.sum > 21
    }

    /// Two cards, an Ace and a ten. Whether it pays as a natural also depends on
    /// the hand not coming from a split.
    pub fn is_natural(&self) -> bool {
        self.total == 2 && self.counts[0] == 1 && self.counts[9] == 1
    }

    pub fn get_actual_sum(&self) -> u16 {
        if self.is_soft() {
            self.sum + 10
        } else {
            self.sum
        }
    }

    /// The rank of a two-card pair, if the hand is one.
    pub fn pair_rank(&self) -> Option<u8> {
        if self.total != 2 {
            return None;
        }
        self.counts
            .iter()
            .position(|c| *c == 2)
            .map(|i| (i + 1) as u8)
    }

    /// Ranks of all held cards, in ascending order.
    pub fn cards(&self) -> Vec<u8> {
        let mut cards = Vec::with_capacity(self.total as usize);
        for (i, count) in self.counts.iter().enumerate() {
            for _ in 0..*count {
                cards.push((i + 1) as u8);
            }
        }
        cards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn soft_and_hard_sums() {
        let hand = Hand::from_cards(&[1, 6]).unwrap();
        assert!(hand.is_soft());
        assert_eq!(hand.get_sum(), 7);
        assert_eq!(hand.get_actual_sum(), 17);

        let hand = hand.with_card(10);
        assert!(!hand.is_soft());
        assert!(hand.has_ace());
        assert_eq!(hand.get_actual_sum(), 17);
        assert!(!hand.bust());

        let hand = hand.with_card(5);
        assert!(hand.bust());
    }

    #[test]
    fn two_aces_are_soft_twelve() {
        let hand = Hand::from_cards(&[1, 1]).unwrap();
        assert_eq!(hand.get_actual_sum(), 12);
        assert_eq!(hand.pair_rank(), Some(1));
        assert!(!hand.is_natural());
    }

    #[test]
    fn natural_and_pairs() {
        let natural = Hand::from_cards(&[10, 1]).unwrap();
        assert!(natural.is_natural());
        assert_eq!(natural.get_actual_sum(), 21);
        assert_eq!(natural.pair_rank(), None);

        let hand = Hand::from_cards(&[8, 8]).unwrap();
        assert_eq!(hand.pair_rank(), Some(8));
        assert_eq!(hand.with_card(8).pair_rank(), None);
        assert_eq!(hand.with_card(3).cards(), vec![3, 8, 8]);
    }

    #[test]
    fn should_reject_invalid_cards() {
        assert!(matches!(Hand::from_cards(&[0]), Err(Error::InvalidCard(_))));
        assert!(matches!(Hand::from_cards(&[2, 11]), Err(Error::InvalidCard(_))));
    }
}
