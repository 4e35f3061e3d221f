//! Least Frequently Used (LFU) core.
//!
//! Values live in a key map; access counts live in [`FrequencyBuckets`].
//!
//! ```text
//!   entries: FxHashMap<K, (V, deadline)>     freq: FrequencyBuckets<K>
//!                                             freq=1: [z] ◄──► [y] ◄── victim
//!                                             freq=2: [x]
//!                                             min_freq = 1
//! ```
//!
//! - A new key enters at frequency 1.
//! - `get` and an update through `insert` raise the frequency by one.
//! - At capacity the oldest key of the lowest frequency is evicted before
//!   the new key is admitted, so a fresh key is never its own victim.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::expiry::TtlMode;
use crate::policy::at_capacity;
use crate::traits::{Eviction, EvictionCause, PolicyCore};

#[derive(Debug)]
pub struct LfuCore<K, V> {
    entries: FxHashMap<K, (V, Option<Instant>)>,
    freq: FrequencyBuckets<K>,
    max_entries: usize,
}

impl<K, V> LfuCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Current access count of `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.freq.frequency(key)
    }

    /// Lowest access count among stored keys (0 when empty).
    pub fn min_frequency(&self) -> u64 {
        self.freq.min_freq()
    }

    fn evict_lfu(&mut self, evicted: &mut Vec<Eviction<K, V>>) {
        if let Some((key, _)) = self.freq.pop_min() {
            if let Some((value, _)) = self.entries.remove(&key) {
                evicted.push(Eviction::new(key, value, EvictionCause::EvictedForCapacity));
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.entries.len(), self.freq.len());
        if self.max_entries != 0 {
            assert!(self.entries.len() <= self.max_entries);
        }
        for key in self.entries.keys() {
            assert!(self.freq.contains(key));
        }
        self.freq.debug_validate_invariants();
    }
}

impl<K, V> PolicyCore<K, V> for LfuCore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    const NAME: &'static str = "lfu";
    const TTL_MODE: TtlMode = TtlMode::Capped;

    fn new(max_entries: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            freq: FrequencyBuckets::new(),
            max_entries,
        }
    }

    fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(
        &mut self,
        key: K,
        value: V,
        expires_at: Option<Instant>,
        evicted: &mut Vec<Eviction<K, V>>,
    ) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = (value, expires_at);
            self.freq.touch(&key);
            return;
        }

        if at_capacity(self.entries.len(), self.max_entries) {
            self.evict_lfu(evicted);
        }
        self.freq.insert(key.clone());
        self.entries.insert(key, (value, expires_at));
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.freq.touch(key);
        self.entries.get(key).map(|(value, _)| value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(value, _)| value)
    }

    fn expiry(&self, key: &K) -> Option<Option<Instant>> {
        self.entries.get(key).map(|&(_, expires_at)| expires_at)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let (value, _) = self.entries.remove(key)?;
        self.freq.remove(key);
        Some(value)
    }

    fn for_each(&self, f: &mut dyn FnMut(&K, &V, Option<Instant>)) {
        for (key, (value, expires_at)) in &self.entries {
            f(key, value, *expires_at);
        }
    }

    fn drain(&mut self) -> Vec<(K, V, Option<Instant>)> {
        self.freq.clear();
        self.entries
            .drain()
            .map(|(key, (value, expires_at))| (key, value, expires_at))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(core: &mut LfuCore<&'static str, i32>, key: &'static str) -> Vec<&'static str> {
        let mut evicted = Vec::new();
        core.insert(key, 0, None, &mut evicted);
        evicted.into_iter().map(|ev| ev.key).collect()
    }

    mod frequency_tracking {
        use super::*;

        #[test]
        fn new_key_starts_at_one() {
            let mut core = LfuCore::new(4);
            insert(&mut core, "a");
            assert_eq!(core.frequency(&"a"), Some(1));
            assert_eq!(core.min_frequency(), 1);
        }

        #[test]
        fn get_and_update_bump_frequency() {
            let mut core = LfuCore::new(4);
            insert(&mut core, "a");
            core.get(&"a");
            insert(&mut core, "a");
            assert_eq!(core.frequency(&"a"), Some(3));
            assert_eq!(core.min_frequency(), 3);
            core.debug_validate_invariants();
        }

        #[test]
        fn peek_does_not_bump() {
            let mut core = LfuCore::new(4);
            insert(&mut core, "a");
            assert_eq!(core.peek(&"a"), Some(&0));
            assert_eq!(core.frequency(&"a"), Some(1));
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn least_frequent_is_evicted() {
            let mut core = LfuCore::new(2);
            insert(&mut core, "x");
            insert(&mut core, "y");
            core.get(&"x");
            assert_eq!(insert(&mut core, "z"), vec!["y"]);
            assert!(core.peek(&"x").is_some());
            assert!(core.peek(&"z").is_some());
            core.debug_validate_invariants();
        }

        #[test]
        fn ties_break_by_age() {
            let mut core = LfuCore::new(3);
            insert(&mut core, "a");
            insert(&mut core, "b");
            insert(&mut core, "c");
            assert_eq!(insert(&mut core, "d"), vec!["a"]);
            assert_eq!(insert(&mut core, "e"), vec!["b"]);
        }

        #[test]
        fn removing_min_bucket_rescans() {
            let mut core = LfuCore::new(3);
            insert(&mut core, "a");
            insert(&mut core, "b");
            core.get(&"b");
            core.get(&"b");
            assert_eq!(core.remove(&"a"), Some(0));
            assert_eq!(core.min_frequency(), 3);
            core.debug_validate_invariants();
        }

        #[test]
        fn zero_capacity_is_unbounded() {
            let mut core = LfuCore::new(0);
            for key in ["a", "b", "c", "d"] {
                assert!(insert(&mut core, key).is_empty());
            }
            assert_eq!(core.len(), 4);
        }
    }

    #[test]
    fn drain_resets_frequencies() {
        let mut core = LfuCore::new(2);
        insert(&mut core, "a");
        core.get(&"a");
        assert_eq!(core.drain().len(), 1);
        assert!(core.is_empty());
        assert_eq!(core.min_frequency(), 0);
        insert(&mut core, "a");
        assert_eq!(core.frequency(&"a"), Some(1));
    }
}
