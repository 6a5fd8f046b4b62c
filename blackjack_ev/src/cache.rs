use crate::outcome::{DealerTotal, Distribution, OutcomeTable};
use crate::shoe::{Shoe, ShoeFingerprint};
use crate::{solver, Error, HouseRules, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    fingerprint: ShoeFingerprint,
    /// Number of further card removals the table accounts for exactly.
    depth: usize,
}

type Slot = Arc<OnceLock<Result<Arc<OutcomeTable>>>>;

/// Memoized dealer outcome tables of one calculation session.
///
/// Each (shoe, depth) table is computed at most once, even when several
/// threads ask for it at the same time: the map lock is only held to find the
/// slot of a key, and the slot itself makes late callers wait for the first.
#[derive(Debug)]
pub struct OutcomeCache {
    dealer_hits_soft17: bool,
    entries: Mutex<HashMap<CacheKey, Slot>>,
    computed_tables: AtomicUsize,
}

impl OutcomeCache {
    pub fn new(dealer_hits_soft17: bool) -> Self {
        OutcomeCache {
            dealer_hits_soft17,
            entries: Mutex::new(HashMap::new()),
            computed_tables: AtomicUsize::new(0),
        }
    }

    pub fn for_rules(rules: &HouseRules) -> Self {
        Self::new(rules.dealer_hits_soft17())
    }

    pub fn dealer_hits_soft17(&self) -> bool {
        self.dealer_hits_soft17
    }

    /// The dealer outcome distribution from `state`, drawing from `shoe`.
    ///
    /// Totals the dealer stands on are answered without touching the cache.
    /// Fails with [`Error::EmptyShoe`] when the dealer may run out of cards
    /// before reaching a final total.
    pub fn lookup(&self, shoe: &Shoe, depth: usize, state: DealerTotal) -> Result<Distribution> {
        if let Some(distribution) = state.terminal(self.dealer_hits_soft17) {
            return Ok(distribution);
        }
        let distribution = self.table(shoe, depth)?[state];
        if !distribution.is_computed() {
            return Err(Error::EmptyShoe);
        }
        Ok(distribution)
    }

    /// The full outcome table of `shoe`, computing it on first request.
    pub fn table(&self, shoe: &Shoe, depth: usize) -> Result<Arc<OutcomeTable>> {
        if shoe.is_empty() {
            return Err(Error::EmptyShoe);
        }
        let key = CacheKey {
            fingerprint: shoe.fingerprint(),
            depth,
        };
        let slot = self.lock_entries().entry(key).or_default().clone();

        if let Some(result) = slot.get() {
            trace!(?key, "outcome table cache hit");
            return result.clone();
        }
        slot.get_or_init(|| {
            self.computed_tables.fetch_add(1, Ordering::Relaxed);
            debug!(
                cards = shoe.total(),
                depth, "computing dealer outcome table"
            );
            solver::solve(self, shoe, depth).map(Arc::new)
        })
        .clone()
    }

    /// How many tables have been computed since creation or the last clear.
    pub fn computed_tables(&self) -> usize {
        self.computed_tables.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
        self.computed_tables.store(0, Ordering::Relaxed);
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        // Slots are only inserted under the lock, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::DealerOutcome;
    use rand::Rng;

    #[test]
    fn terminal_totals_skip_the_cache() {
        let cache = OutcomeCache::new(false);
        let mut rng = rand::thread_rng();
        for _turn in 0..10 {
            let mut counts = [0; 10];
            for count in counts.iter_mut() {
                *count = rng.gen_range(0..=32);
            }
            let shoe = Shoe::new(&counts).unwrap();
            assert_eq!(
                cache.lookup(&shoe, 3, DealerTotal::hard(22)).unwrap(),
                Distribution::unit(DealerOutcome::Bust)
            );
            assert_eq!(
                cache.lookup(&shoe, 0, DealerTotal::hard(17)).unwrap(),
                Distribution::unit(DealerOutcome::H17)
            );
        }
        assert!(cache.is_empty());
        assert_eq!(cache.computed_tables(), 0);

        // Even an empty shoe answers terminal totals.
        let empty = Shoe::new(&[0; 10]).unwrap();
        assert!(cache.lookup(&empty, 0, DealerTotal::soft(19)).is_ok());
        assert_eq!(
            cache.lookup(&empty, 0, DealerTotal::hard(12)),
            Err(Error::EmptyShoe)
        );
    }

    #[test]
    fn table_is_computed_once_per_key() {
        let cache = OutcomeCache::new(false);
        let shoe = Shoe::with_number_of_decks(8);
        let first = cache.table(&shoe, 0).unwrap();
        let second = cache.table(&shoe, 0).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.computed_tables(), 1);

        // Same counts reached by different draws share the entry.
        let a = shoe.draw(2).unwrap().draw(9).unwrap();
        let b = shoe.draw(9).unwrap().draw(2).unwrap();
        cache.lookup(&a, 0, DealerTotal::hard(12)).unwrap();
        cache.lookup(&b, 0, DealerTotal::hard(13)).unwrap();
        assert_eq!(cache.computed_tables(), 2);

        // A different depth is a different table.
        cache.table(&shoe, 1).unwrap();
        assert_eq!(cache.computed_tables(), 2 + 1 + 10);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.computed_tables(), 0);
    }

    #[test]
    fn concurrent_lookups_compute_once() {
        let cache = OutcomeCache::new(true);
        let shoe = Shoe::with_number_of_decks(6);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for total in 2..=16 {
                        cache.lookup(&shoe, 0, DealerTotal::hard(total)).unwrap();
                    }
                });
            }
        });
        assert_eq!(cache.computed_tables(), 1);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| cache.table(&shoe, 1).unwrap());
            }
        });
        // The depth 1 table and its ten one-card-removed children.
        assert_eq!(cache.computed_tables(), 1 + 1 + 10);
    }
}
