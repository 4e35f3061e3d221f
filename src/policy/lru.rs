//! Least Recently Used (LRU) core.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, SlotId>         list: IntrusiveList<Entry<K, V>>
//!   ┌─────────┬────────┐
//!   │ "a"     │ id_2   │─────┐          head (MRU)                tail (LRU)
//!   │ "b"     │ id_0   │───┐ └────────►  [a] ◄──► [c] ◄──► [b]  ◄── evict
//!   │ "c"     │ id_1   │─┐ └──────────────────────────────────┘
//!   └─────────┴────────┘ └───────────────────────┘
//! ```
//!
//! - `get` and an update through `insert` move the entry to the head.
//! - A new key arriving at capacity first evicts the tail, then is pushed
//!   at the head.
//!
//! All operations are O(1).
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::policy::LruCore;
//! use evictkit::traits::PolicyCore;
//!
//! let mut core = LruCore::new(2);
//! let mut evicted = Vec::new();
//! core.insert("a", 1, None, &mut evicted);
//! core.insert("b", 2, None, &mut evicted);
//! core.get(&"a");
//! core.insert("c", 3, None, &mut evicted);
//!
//! assert_eq!(evicted.len(), 1);
//! assert_eq!(evicted[0].key, "b");
//! ```

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::expiry::TtlMode;
use crate::policy::{Entry, at_capacity};
use crate::traits::{Eviction, EvictionCause, PolicyCore};

#[derive(Debug)]
pub struct LruCore<K, V> {
    index: FxHashMap<K, SlotId>,
    list: IntrusiveList<Entry<K, V>>,
    max_entries: usize,
}

impl<K, V> LruCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Least recently used key, the next eviction victim.
    pub fn peek_lru(&self) -> Option<&K> {
        self.list.back().map(|entry| &entry.key)
    }

    /// Keys from most to least recently used.
    pub fn recency_order(&self) -> Vec<K> {
        self.list.iter().map(|entry| entry.key.clone()).collect()
    }

    fn evict_lru(&mut self, evicted: &mut Vec<Eviction<K, V>>) {
        if let Some(entry) = self.list.pop_back() {
            self.index.remove(&entry.key);
            evicted.push(Eviction::new(
                entry.key,
                entry.value,
                EvictionCause::EvictedForCapacity,
            ));
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.index.len(), self.list.len());
        if self.max_entries != 0 {
            assert!(self.list.len() <= self.max_entries);
        }
        for (key, &id) in &self.index {
            let entry = self.list.get(id).expect("indexed slot missing");
            assert!(&entry.key == key);
        }
        self.list.debug_validate_invariants();
    }
}

impl<K, V> PolicyCore<K, V> for LruCore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    const NAME: &'static str = "lru";
    const TTL_MODE: TtlMode = TtlMode::Capped;

    fn new(max_entries: usize) -> Self {
        Self {
            index: FxHashMap::default(),
            list: IntrusiveList::new(),
            max_entries,
        }
    }

    fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn insert(
        &mut self,
        key: K,
        value: V,
        expires_at: Option<Instant>,
        evicted: &mut Vec<Eviction<K, V>>,
    ) {
        if let Some(&id) = self.index.get(&key) {
            if let Some(entry) = self.list.get_mut(id) {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            self.list.move_to_front(id);
            return;
        }

        if at_capacity(self.index.len(), self.max_entries) {
            self.evict_lru(evicted);
        }
        let id = self.list.push_front(Entry::new(key.clone(), value, expires_at));
        self.index.insert(key, id);
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.move_to_front(id);
        self.list.get(id).map(|entry| &entry.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| &entry.value)
    }

    fn expiry(&self, key: &K) -> Option<Option<Instant>> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| entry.expires_at)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.list.remove(id).map(|entry| entry.value)
    }

    fn for_each(&self, f: &mut dyn FnMut(&K, &V, Option<Instant>)) {
        for entry in self.list.iter() {
            f(&entry.key, &entry.value, entry.expires_at);
        }
    }

    fn drain(&mut self) -> Vec<(K, V, Option<Instant>)> {
        self.index.clear();
        let mut out = Vec::with_capacity(self.list.len());
        while let Some(entry) = self.list.pop_back() {
            out.push(entry.into_parts());
        }
        out
    }
}
