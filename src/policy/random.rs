//! Random-eviction core.
//!
//! Entries are packed densely in a `Vec`; the key index stores each entry's
//! position. Eviction draws a uniform index and swap-removes it, patching
//! the index of the entry that moved into the hole.
//!
//! ```text
//!   index: FxHashMap<K, usize>     entries: Vec<Entry<K, V>>
//!   ┌─────┬───┐                    ┌─────┬─────┬─────┬─────┐
//!   │ "a" │ 0 │                    │  a  │  b  │  c  │  d  │
//!   │ "b" │ 1 │   evict idx 1 ──►  ├─────┼─────┼─────┼─────┘
//!   │ "c" │ 2 │                    │  a  │  d  │  c  │       d's index: 3 → 1
//!   │ "d" │ 3 │                    └─────┴─────┴─────┘
//!   └─────┴───┘
//! ```
//!
//! Reads never reorder anything, so this core runs `get` under a shared lock.
//! A new key is admitted after the eviction, so it is never its own victim.

use std::hash::Hash;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::expiry::TtlMode;
use crate::policy::{Entry, at_capacity};
use crate::traits::{Eviction, EvictionCause, PolicyCore};

#[derive(Debug)]
pub struct RandomCore<K, V> {
    index: FxHashMap<K, usize>,
    entries: Vec<Entry<K, V>>,
    rng: SmallRng,
    max_entries: usize,
}

impl<K, V> RandomCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a core with a fixed RNG seed, for reproducible eviction order.
    pub fn with_seed(max_entries: usize, seed: u64) -> Self {
        Self::with_rng(max_entries, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(max_entries: usize, rng: SmallRng) -> Self {
        Self {
            index: FxHashMap::default(),
            entries: Vec::new(),
            rng,
            max_entries,
        }
    }

    fn evict_random(&mut self, evicted: &mut Vec<Eviction<K, V>>) {
        if self.entries.is_empty() {
            return;
        }
        let victim = self.rng.gen_range(0..self.entries.len());
        let entry = self.take(victim);
        evicted.push(Eviction::new(
            entry.key,
            entry.value,
            EvictionCause::EvictedForCapacity,
        ));
    }

    /// Swap-removes the entry at `pos` and fixes the moved entry's index.
    fn take(&mut self, pos: usize) -> Entry<K, V> {
        let entry = self.entries.swap_remove(pos);
        self.index.remove(&entry.key);
        if let Some(moved) = self.entries.get(pos) {
            if let Some(slot) = self.index.get_mut(&moved.key) {
                *slot = pos;
            }
        }
        entry
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.index.len(), self.entries.len());
        if self.max_entries != 0 {
            assert!(self.entries.len() <= self.max_entries);
        }
        for (key, &pos) in &self.index {
            assert!(&self.entries[pos].key == key);
        }
    }
}

impl<K, V> PolicyCore<K, V> for RandomCore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    const NAME: &'static str = "random";
    const TTL_MODE: TtlMode = TtlMode::Fallback;
    const GET_MUTATES: bool = false;

    fn new(max_entries: usize) -> Self {
        Self::with_rng(max_entries, SmallRng::from_entropy())
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
        if let Some(&pos) = self.index.get(&key) {
            let entry = &mut self.entries[pos];
            entry.value = value;
            entry.expires_at = expires_at;
            return;
        }

        if at_capacity(self.entries.len(), self.max_entries) {
            self.evict_random(evicted);
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(Entry::new(key, value, expires_at));
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        self.peek(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let &pos = self.index.get(key)?;
        self.entries.get(pos).map(|entry| &entry.value)
    }

    fn expiry(&self, key: &K) -> Option<Option<Instant>> {
        let &pos = self.index.get(key)?;
        self.entries.get(pos).map(|entry| entry.expires_at)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let &pos = self.index.get(key)?;
        Some(self.take(pos).value)
    }

    fn for_each(&self, f: &mut dyn FnMut(&K, &V, Option<Instant>)) {
        for entry in &self.entries {
            f(&entry.key, &entry.value, entry.expires_at);
        }
    }

    fn drain(&mut self) -> Vec<(K, V, Option<Instant>)> {
        self.index.clear();
        self.entries.drain(..).map(Entry::into_parts).collect()
    }
}
