//! Two-Queue (2Q) core.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────┐        ┌─────────────────────────────┐
//!   │ A1 (FIFO, first access)     │  hit   │ A2 (LRU, re-accessed)       │
//!   │ front ─► [new] .. [old] ◄───┼──────► │ MRU ─► [..] .. [..] ◄── LRU │
//!   └──────────────┬──────────────┘        └──────────────┬──────────────┘
//!                  │ evicted first                        │ evicted only when
//!                  ▼                                      ▼ A1 is empty
//!   ┌─────────────────────────────┐                    (dropped, no ghost)
//!   │ B (ghost keys from A1)      │
//!   └─────────────────────────────┘
//! ```
//!
//! - A new key enters the front of A1.
//! - `get` or an update of an A1 key moves it to the front of A2; an A2 key
//!   moves to the front of A2.
//! - At capacity, A1's tail is evicted (and remembered in B); A2's tail is
//!   evicted only when A1 is empty.
//! - B is bookkeeping only. A `get` miss on a ghost consumes it and returns
//!   nothing; a `set` of a ghost consumes it and admits the key to A1 like
//!   any other new key.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::ghost_list::GhostList;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::expiry::TtlMode;
use crate::policy::{Entry, at_capacity};
use crate::traits::{Eviction, EvictionCause, PolicyCore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Queue {
    A1,
    A2,
}

#[derive(Debug)]
pub struct TwoQCore<K, V> {
    index: FxHashMap<K, (Queue, SlotId)>,
    a1: IntrusiveList<Entry<K, V>>,
    a2: IntrusiveList<Entry<K, V>>,
    ghosts: GhostList<K>,
    max_entries: usize,
}

impl<K, V> TwoQCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Nominal A1 size: a quarter of the capacity, at least one.
    ///
    /// Reported for introspection; eviction does not consult it.
    pub fn a1_target(&self) -> usize {
        (self.max_entries / 4).max(1)
    }

    pub fn a1_len(&self) -> usize {
        self.a1.len()
    }

    pub fn a2_len(&self) -> usize {
        self.a2.len()
    }

    pub fn ghost_len(&self) -> usize {
        self.ghosts.len()
    }

    pub fn is_ghost(&self, key: &K) -> bool {
        self.ghosts.contains(key)
    }

    fn evict_one(&mut self, evicted: &mut Vec<Eviction<K, V>>) {
        let entry = if let Some(entry) = self.a1.pop_back() {
            self.ghosts.record(entry.key.clone());
            entry
        } else if let Some(entry) = self.a2.pop_back() {
            entry
        } else {
            return;
        };
        self.index.remove(&entry.key);
        evicted.push(Eviction::new(
            entry.key,
            entry.value,
            EvictionCause::EvictedForCapacity,
        ));
    }

    fn promote(&mut self, key: &K) -> Option<SlotId> {
        let (queue, id) = *self.index.get(key)?;
        match queue {
            Queue::A1 => {
                let entry = self.a1.remove(id)?;
                let new_id = self.a2.push_front(entry);
                self.index.insert(key.clone(), (Queue::A2, new_id));
                Some(new_id)
            },
            Queue::A2 => {
                self.a2.move_to_front(id);
                Some(id)
            },
        }
    }

    fn entry(&self, key: &K) -> Option<&Entry<K, V>> {
        let &(queue, id) = self.index.get(key)?;
        match queue {
            Queue::A1 => self.a1.get(id),
            Queue::A2 => self.a2.get(id),
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.index.len(), self.a1.len() + self.a2.len());
        if self.max_entries != 0 {
            assert!(self.index.len() <= self.max_entries);
            assert!(self.ghosts.len() <= self.max_entries);
        }
        for key in self.index.keys() {
            assert!(!self.ghosts.contains(key), "live key is also a ghost");
            assert!(self.entry(key).is_some_and(|e| &e.key == key));
        }
        self.a1.debug_validate_invariants();
        self.a2.debug_validate_invariants();
        self.ghosts.debug_validate_invariants();
    }
}

impl<K, V> PolicyCore<K, V> for TwoQCore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    const NAME: &'static str = "twoq";
    const TTL_MODE: TtlMode = TtlMode::Fallback;

    fn new(max_entries: usize) -> Self {
        Self {
            index: FxHashMap::default(),
            a1: IntrusiveList::new(),
            a2: IntrusiveList::new(),
            ghosts: GhostList::new(max_entries),
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
        if let Some(id) = self.promote(&key) {
            if let Some(entry) = self.a2.get_mut(id) {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            return;
        }

        self.ghosts.remove(&key);
        if at_capacity(self.index.len(), self.max_entries) {
            self.evict_one(evicted);
        }
        let id = self.a1.push_front(Entry::new(key.clone(), value, expires_at));
        self.index.insert(key, (Queue::A1, id));
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        match self.promote(key) {
            Some(id) => self.a2.get(id).map(|entry| &entry.value),
            None => {
                self.ghosts.remove(key);
                None
            },
        }
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.entry(key).map(|entry| &entry.value)
    }

    fn expiry(&self, key: &K) -> Option<Option<Instant>> {
        self.entry(key).map(|entry| entry.expires_at)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let (queue, id) = self.index.remove(key)?;
        let entry = match queue {
            Queue::A1 => self.a1.remove(id),
            Queue::A2 => self.a2.remove(id),
        };
        entry.map(|entry| entry.value)
    }

    fn for_each(&self, f: &mut dyn FnMut(&K, &V, Option<Instant>)) {
        for entry in self.a1.iter().chain(self.a2.iter()) {
            f(&entry.key, &entry.value, entry.expires_at);
        }
    }

    fn drain(&mut self) -> Vec<(K, V, Option<Instant>)> {
        self.index.clear();
        self.ghosts.clear();
        let mut out = Vec::with_capacity(self.a1.len() + self.a2.len());
        while let Some(entry) = self.a1.pop_back() {
            out.push(entry.into_parts());
        }
        while let Some(entry) = self.a2.pop_back() {
            out.push(entry.into_parts());
        }
        out
    }
}
