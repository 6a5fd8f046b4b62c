use crate::{error::check_rank, Error, HouseRules, Result};
use std::ops::Index;

const FIELD_BITS: u32 = 12;
/// Largest count a single rank may hold, so that every count fits in its field.
pub const MAX_RANK_COUNT: u16 = (1 << FIELD_BITS) - 1;
const POW_BASE: [u128; 10] = get_powers_of_base();

const fn get_powers_of_base() -> [u128; 10] {
    let mut ret: [u128; 10] = [0; 10];
    ret[0] = 1;

    let mut i = 1;
    while i < ret.len() {
        ret[i] = ret[i - 1] << FIELD_BITS;
        i += 1;
    }

    ret
}

/// Canonical key of a shoe: the ten counts packed into fixed-width fields, so
/// two shoes share a fingerprint exactly when their counts are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShoeFingerprint(u128);

/// Draw probability of each rank, indexed by rank in [1, 10].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityVector([f64; 10]);

impl ProbabilityVector {
    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.0.iter().enumerate().map(|(i, p)| (i as u8 + 1, *p))
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Note that `rank` must be in [1, 10]; it is not checked.
impl Index<u8> for ProbabilityVector {
    type Output = f64;
    fn index(&self, rank: u8) -> &Self::Output {
        &self.0[(rank - 1) as usize]
    }
}

/// The undealt cards, as the number of remaining cards of each rank (Ace is 1,
/// all ten-valued cards are pooled as 10).
///
/// A shoe never changes once built: [`Shoe::draw`] returns a new shoe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shoe {
    counts: [u16; 10],
    fingerprint: ShoeFingerprint,
    total: u16,
}

impl Shoe {
    pub fn new(counts: &[u16; 10]) -> Result<Shoe> {
        if let Some(count) = counts.iter().find(|c| **c > MAX_RANK_COUNT) {
            return Err(Error::InvalidCard(format!(
                "{} cards of one rank exceeds the limit of {}",
                count, MAX_RANK_COUNT
            )));
        }

        let mut fingerprint = 0;
        let mut total = 0;
        for i in 0..counts.len() {
            fingerprint += (counts[i] as u128) * POW_BASE[i];
            total += counts[i];
        }

        Ok(Shoe {
            counts: *counts,
            fingerprint: ShoeFingerprint(fingerprint),
            total,
        })
    }

    pub fn with_number_of_decks(number_of_decks: u8) -> Shoe {
        let mut counts = [(number_of_decks as u16) * 4; 10];
        counts[9] = (number_of_decks as u16) * 16;
        // At most 255 decks, which stays far below MAX_RANK_COUNT per field.
        let mut fingerprint = 0;
        for i in 0..counts.len() {
            fingerprint += (counts[i] as u128) * POW_BASE[i];
        }
        Shoe {
            counts,
            fingerprint: ShoeFingerprint(fingerprint),
            total: counts.iter().sum(),
        }
    }

    /// The starting shoe for the given rules.
    pub fn factory(rules: &HouseRules) -> Shoe {
        Self::with_number_of_decks(rules.shoe_size())
    }

    /// Draw probability of each rank. Fails if the shoe is empty.
    pub fn probabilities(&self) -> Result<ProbabilityVector> {
        if self.total == 0 {
            return Err(Error::EmptyShoe);
        }
        let total = self.total as f64;
        let mut p = [0.0; 10];
        for (i, count) in self.counts.iter().enumerate() {
            p[i] = *count as f64 / total;
        }
        Ok(ProbabilityVector(p))
    }

    /// Returns the shoe left after removing one card of the given rank.
    pub fn draw(&self, rank: u8) -> Result<Shoe> {
        let rank = check_rank(rank)?;
        let index = (rank - 1) as usize;
        if self.counts[index] == 0 {
            return Err(Error::InvalidDraw { rank });
        }

        let mut shoe = self.clone();
        shoe.counts[index] -= 1;
        shoe.fingerprint = ShoeFingerprint(self.fingerprint.0 - POW_BASE[index]);
        shoe.total -= 1;
        Ok(shoe)
    }

    /// Removes the given cards one after another.
    pub fn draw_all(&self, ranks: &[u8]) -> Result<Shoe> {
        let mut shoe = self.clone();
        for rank in ranks {
            shoe = shoe.draw(*rank)?;
        }
        Ok(shoe)
    }

    pub fn fingerprint(&self) -> ShoeFingerprint {
        self.fingerprint
    }

    pub fn total(&self) -> u16 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn counts(&self) -> &[u16; 10] {
        &self.counts
    }
}

/// Remaining count of a rank. Note that `rank` must be in [1, 10]; it is not
/// checked.
impl Index<u8> for Shoe {
    type Output = u16;
    fn index(&self, rank: u8) -> &Self::Output {
        &self.counts[(rank - 1) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn generate_random_counts(number_of_decks: u8) -> [u16; 10] {
        let mut rng = rand::thread_rng();
        let mut counts: [u16; 10] = [0; 10];
        for i in 0..9 {
            counts[i] = rng.gen_range(0..=(number_of_decks as u16) * 4);
        }
        counts[9] = rng.gen_range(1..=(number_of_decks as u16) * 16);

        counts
    }

    fn packed(counts: &[u16; 10]) -> u128 {
        let mut ret: u128 = 0;
        for i in (0..10).rev() {
            ret = (ret << FIELD_BITS) + (counts[i] as u128);
        }

        ret
    }

    #[test]
    fn fingerprint_of_shoe() {
        for _turn in 0..10 {
            let counts = generate_random_counts(8);
            let shoe = Shoe::new(&counts).unwrap();
            assert_eq!(shoe.fingerprint, ShoeFingerprint(packed(&counts)));
        }
    }

    #[test]
    fn factory_builds_full_shoe() {
        let rules = HouseRules::builder().shoe_size(6).build().unwrap();
        let shoe = Shoe::factory(&rules);
        assert_eq!(shoe.total(), 6 * 52);
        assert_eq!(shoe[1], 24);
        assert_eq!(shoe[9], 24);
        assert_eq!(shoe[10], 96);

        let mut counts = [24; 10];
        counts[9] = 96;
        assert_eq!(shoe, Shoe::new(&counts).unwrap());
    }

    #[test]
    fn probabilities_sum_to_one() {
        for _turn in 0..20 {
            let shoe = Shoe::new(&generate_random_counts(8)).unwrap();
            let p = shoe.probabilities().unwrap();
            assert!((p.sum() - 1.0).abs() < 1e-9);
            for (rank, p_rank) in p.iter() {
                assert!((0.0..=1.0).contains(&p_rank));
                assert_eq!(p_rank, shoe[rank] as f64 / shoe.total() as f64);
            }
        }
    }

    #[test]
    fn empty_shoe_has_no_probabilities() {
        let shoe = Shoe::new(&[0; 10]).unwrap();
        assert!(shoe.is_empty());
        assert_eq!(shoe.probabilities(), Err(Error::EmptyShoe));
    }

    #[test]
    fn exhausted_rank_has_zero_probability() {
        let shoe = Shoe::new(&[0, 1, 1, 1, 1, 1, 1, 1, 1, 4]).unwrap();
        let p = shoe.probabilities().unwrap();
        assert_eq!(p[1], 0.0);
        assert_eq!(p[10], 4.0 / 12.0);
    }

    #[test]
    fn draw_twice_equals_direct_construction() {
        let shoe = Shoe::with_number_of_decks(8);
        let drawn = shoe.draw(5).unwrap().draw(5).unwrap();

        let mut counts = *shoe.counts();
        counts[4] -= 2;
        let direct = Shoe::new(&counts).unwrap();

        assert_eq!(drawn, direct);
        assert_eq!(drawn.fingerprint(), direct.fingerprint());
        assert_eq!(drawn.probabilities(), direct.probabilities());
        // The original shoe is untouched.
        assert_eq!(shoe[5], 32);
    }

    #[test]
    fn draw_order_does_not_matter() {
        let shoe = Shoe::with_number_of_decks(4);
        let a = shoe.draw_all(&[1, 10, 3]).unwrap();
        let b = shoe.draw_all(&[3, 1, 10]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), shoe.fingerprint());
        assert_eq!(a.total(), shoe.total() - 3);
    }

    #[test]
    fn should_return_error_when_drawing_missing_card() {
        let shoe = Shoe::new(&[0, 0, 0, 0, 1, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(shoe.draw(2), Err(Error::InvalidDraw { rank: 2 }));
        let shoe = shoe.draw(5).unwrap();
        assert_eq!(shoe.draw(5), Err(Error::InvalidDraw { rank: 5 }));
        assert!(matches!(shoe.draw(11), Err(Error::InvalidCard(_))));
        assert!(matches!(shoe.draw(0), Err(Error::InvalidCard(_))));
    }

    #[test]
    fn should_reject_oversized_counts() {
        let mut counts = [0; 10];
        counts[3] = MAX_RANK_COUNT + 1;
        assert!(matches!(Shoe::new(&counts), Err(Error::InvalidCard(_))));
    }
}
