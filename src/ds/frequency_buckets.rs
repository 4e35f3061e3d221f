//! Frequency buckets for O(1) LFU bookkeeping.
//!
//! Each tracked key sits in the bucket for its access count. Within a bucket
//! keys are ordered by arrival, so the eviction victim is the oldest key of
//! the lowest-frequency bucket.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, (freq, SlotId)>
//!   ┌──────────┬─────────────┐
//!   │ "page_a" │ (2, id_0)   │───────────────┐
//!   │ "page_b" │ (1, id_1)   │─────────┐     │
//!   │ "page_c" │ (1, id_2)   │───┐     │     │
//!   └──────────┴─────────────┘   │     │     │
//!                                ▼     ▼     │
//!   buckets:  freq=1: head ─► [c] ◄──► [b] ◄── tail (evict first)
//!             freq=2: head ─► [a] ◄── tail   ◄┘
//!
//!   min_freq = 1
//! ```
//!
//! ## Operations
//!
//! | Operation  | Time          | Notes                                  |
//! |------------|---------------|----------------------------------------|
//! | `insert`   | O(1)          | New key starts at freq=1, min_freq = 1 |
//! | `touch`    | O(1)          | f → f+1, advances min_freq if f emptied|
//! | `pop_min`  | O(1) / O(B)   | Oldest key at min_freq; rescans bucket |
//! |            |               | keys when the min bucket empties       |
//! | `remove`   | O(1) / O(B)   | Rescans bucket keys when min empties   |
//!
//! `debug_validate_invariants()` is available in debug/test builds.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;

#[derive(Debug)]
pub struct FrequencyBuckets<K> {
    index: FxHashMap<K, (u64, SlotId)>,
    buckets: FxHashMap<u64, IntrusiveList<K>>,
    min_freq: u64,
}

impl<K> FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            index: FxHashMap::default(),
            buckets: FxHashMap::default(),
            min_freq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Lowest frequency currently tracked (0 when empty).
    pub fn min_freq(&self) -> u64 {
        self.min_freq
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.index.get(key).map(|&(freq, _)| freq)
    }

    /// Starts tracking `key` at frequency 1. Returns `false` if already tracked.
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let id = self.buckets.entry(1).or_default().push_front(key.clone());
        self.index.insert(key, (1, id));
        self.min_freq = 1;
        true
    }

    /// Bumps `key` one frequency level; returns the new frequency.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let (freq, id) = *self.index.get(key)?;
        let emptied = self.detach(freq, id)?;

        let next = freq.saturating_add(1);
        let new_id = self.buckets.entry(next).or_default().push_front(key.clone());
        if let Some(slot) = self.index.get_mut(key) {
            *slot = (next, new_id);
        }
        if emptied && freq == self.min_freq {
            self.min_freq = next;
        }
        Some(next)
    }

    /// Stops tracking `key`; returns the frequency it had.
    pub fn remove(&mut self, key: &K) -> Option<u64> {
        let (freq, id) = self.index.remove(key)?;
        let emptied = self.detach(freq, id)?;
        if emptied && freq == self.min_freq {
            self.recompute_min();
        }
        Some(freq)
    }

    /// Removes and returns the oldest key of the lowest frequency.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        let freq = self.min_freq;
        let key = self.buckets.get_mut(&freq)?.pop_back()?;
        self.index.remove(&key);
        if self.buckets.get(&freq).is_some_and(IntrusiveList::is_empty) {
            self.buckets.remove(&freq);
            self.recompute_min();
        }
        Some((key, freq))
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    /// Unlinks `id` from bucket `freq`, dropping the bucket if it empties.
    fn detach(&mut self, freq: u64, id: SlotId) -> Option<bool> {
        let bucket = self.buckets.get_mut(&freq)?;
        bucket.remove(id)?;
        let emptied = bucket.is_empty();
        if emptied {
            self.buckets.remove(&freq);
        }
        Some(emptied)
    }

    fn recompute_min(&mut self) {
        self.min_freq = self.buckets.keys().copied().min().unwrap_or(0);
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let total: usize = self.buckets.values().map(IntrusiveList::len).sum();
        assert_eq!(total, self.index.len());
        for (freq, bucket) in &self.buckets {
            assert!(!bucket.is_empty(), "empty bucket {freq} left behind");
            bucket.debug_validate_invariants();
        }
        for (key, &(freq, id)) in &self.index {
            let bucket = self.buckets.get(&freq).expect("bucket for tracked key");
            assert!(bucket.get(id) == Some(key));
        }
        let expected_min = self.buckets.keys().copied().min().unwrap_or(0);
        if !self.index.is_empty() {
            assert_eq!(self.min_freq, expected_min);
        }
    }
}

impl<K> Default for FrequencyBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
