//! Bounded recency list of evicted keys.
//!
//! ARC keeps two of these (B1/B2) and 2Q keeps one (B). Only keys are
//! stored; a ghost hit tells the policy that a recently evicted key came back.
//!
//! ```text
//!   index: FxHashMap<K, SlotId>        list: IntrusiveList<K>
//!   ┌─────────┬─────────┐              head ─► [C] ◄──► [B] ◄──► [A] ◄── tail
//!   │  key A  │  id_1   │               newest                     oldest
//!   │  key B  │  id_2   │
//!   └─────────┴─────────┘
//! ```
//!
//! `record` pushes to the front and trims the back once `capacity` is
//! exceeded. A zero capacity records nothing.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;

#[derive(Debug)]
pub struct GhostList<K> {
    list: IntrusiveList<K>,
    index: FxHashMap<K, SlotId>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::new(),
            index: FxHashMap::default(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Records `key` as the newest ghost, dropping the oldest ones past capacity.
    pub fn record(&mut self, key: K) {
        if self.capacity == 0 {
            return;
        }
        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            return;
        }

        let id = self.list.push_front(key.clone());
        self.index.insert(key, id);
        while self.list.len() > self.capacity {
            match self.list.pop_back() {
                Some(old) => {
                    self.index.remove(&old);
                },
                None => break,
            }
        }
    }

    /// Removes `key`; returns `true` if it was a ghost.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.list.len(), self.index.len());
        assert!(self.list.len() <= self.capacity);
        for &id in self.index.values() {
            assert!(self.list.contains(id));
        }
        self.list.debug_validate_invariants();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_ghost_is_trimmed() {
        let mut ghost = GhostList::new(2);
        ghost.record("a");
        ghost.record("b");
        ghost.record("c");

        assert!(!ghost.contains(&"a"));
        assert!(ghost.contains(&"b"));
        assert!(ghost.contains(&"c"));
        assert_eq!(ghost.len(), 2);
        ghost.debug_validate_invariants();
    }

    #[test]
    fn re_recording_refreshes_position() {
        let mut ghost = GhostList::new(2);
        ghost.record("a");
        ghost.record("b");
        ghost.record("a");
        ghost.record("c");

        assert!(ghost.contains(&"a"));
        assert!(!ghost.contains(&"b"));
        assert!(ghost.contains(&"c"));
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let mut ghost = GhostList::new(0);
        ghost.record("a");
        assert!(ghost.is_empty());
        assert!(!ghost.contains(&"a"));
    }

    #[test]
    fn remove_and_clear() {
        let mut ghost = GhostList::new(3);
        ghost.record(1);
        ghost.record(2);
        assert!(ghost.remove(&1));
        assert!(!ghost.remove(&1));
        assert_eq!(ghost.len(), 1);

        ghost.clear();
        assert!(ghost.is_empty());
        ghost.debug_validate_invariants();
    }
}
