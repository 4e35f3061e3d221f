//! Adaptive Replacement Cache (ARC) core.
//!
//! ## Architecture
//!
//! ```text
//!            recency side                      frequency side
//!   ┌───────────────────────────┐     ┌───────────────────────────┐
//!   │ B1 (ghost keys)           │     │ B2 (ghost keys)           │
//!   │  evicted from T1          │     │  evicted from T2          │
//!   └─────────────▲─────────────┘     └─────────────▲─────────────┘
//!                 │ tail                             │ tail
//!   ┌─────────────┴─────────────┐     ┌─────────────┴─────────────┐
//!   │ T1 (seen once)            │ ──► │ T2 (seen twice or more)   │
//!   │  MRU ─► [..] ◄── LRU      │ hit │  MRU ─► [..] ◄── LRU      │
//!   └───────────────────────────┘     └───────────────────────────┘
//!
//!   0 ◄──────────────── p (target size of T1) ────────────────► max_entries
//! ```
//!
//! ## Adaptation
//!
//! A new key found in B1 means T1 was too small: `p` grows by
//! `max(1, |B2| / |B1|)` (measured after the ghost is consumed, `1` if B1
//! is then empty), capped at `max_entries`. A key found in B2 shrinks `p`
//! symmetrically, floored at 0. A `get` miss that hits a ghost adapts `p`
//! the same way.
//!
//! ## Replacement
//!
//! When the cache is full, one entry is evicted before a new key is
//! admitted: T1's tail (into B1) if `|T1| >= max(1, p)`, otherwise T2's tail
//! (into B2). If the chosen list is empty the other one is used. Ghost lists
//! hold at most `max_entries` keys each. A ghost hit with free room is
//! admitted without a replacement pass; only a full cache replaces.

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
enum ListKind {
    T1,
    T2,
}

#[derive(Debug)]
pub struct ArcCore<K, V> {
    index: FxHashMap<K, (ListKind, SlotId)>,
    t1: IntrusiveList<Entry<K, V>>,
    t2: IntrusiveList<Entry<K, V>>,
    b1: GhostList<K>,
    b2: GhostList<K>,
    p: usize,
    max_entries: usize,
}

impl<K, V> ArcCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Current target size of T1.
    pub fn p(&self) -> usize {
        self.p
    }

    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// `true` if `key` is remembered as recently evicted.
    pub fn is_ghost(&self, key: &K) -> bool {
        self.b1.contains(key) || self.b2.contains(key)
    }

    fn grow_p(&mut self) {
        let delta = if self.b1.is_empty() {
            1
        } else {
            (self.b2.len() / self.b1.len()).max(1)
        };
        self.p = (self.p + delta).min(self.max_entries);
    }

    fn shrink_p(&mut self) {
        let delta = if self.b2.is_empty() {
            1
        } else {
            (self.b1.len() / self.b2.len()).max(1)
        };
        self.p = self.p.saturating_sub(delta);
    }

    /// Consumes a ghost for `key` and adapts `p`; `true` on a ghost hit.
    fn adapt_on_ghost(&mut self, key: &K) -> bool {
        if self.b1.remove(key) {
            self.grow_p();
            true
        } else if self.b2.remove(key) {
            self.shrink_p();
            true
        } else {
            false
        }
    }

    fn replace(&mut self, evicted: &mut Vec<Eviction<K, V>>) {
        let prefer_t1 = self.t1.len() >= self.p.max(1);
        let from_t1 = if prefer_t1 {
            !self.t1.is_empty()
        } else {
            self.t2.is_empty()
        };

        let (list, ghost) = if from_t1 {
            (&mut self.t1, &mut self.b1)
        } else {
            (&mut self.t2, &mut self.b2)
        };
        if let Some(entry) = list.pop_back() {
            self.index.remove(&entry.key);
            ghost.record(entry.key.clone());
            evicted.push(Eviction::new(
                entry.key,
                entry.value,
                EvictionCause::EvictedForCapacity,
            ));
        }
    }

    /// Moves a T1 entry to the front of T2, or refreshes a T2 entry.
    fn promote(&mut self, key: &K) -> Option<SlotId> {
        let (kind, id) = *self.index.get(key)?;
        match kind {
            ListKind::T1 => {
                let entry = self.t1.remove(id)?;
                let new_id = self.t2.push_front(entry);
                self.index.insert(key.clone(), (ListKind::T2, new_id));
                Some(new_id)
            },
            ListKind::T2 => {
                self.t2.move_to_front(id);
                Some(id)
            },
        }
    }

    fn entry(&self, key: &K) -> Option<&Entry<K, V>> {
        let &(kind, id) = self.index.get(key)?;
        match kind {
            ListKind::T1 => self.t1.get(id),
            ListKind::T2 => self.t2.get(id),
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.index.len(), self.t1.len() + self.t2.len());
        assert!(self.p <= self.max_entries);
        if self.max_entries != 0 {
            assert!(self.t1.len() + self.t2.len() <= self.max_entries);
            assert!(self.b1.len() <= self.max_entries);
            assert!(self.b2.len() <= self.max_entries);
        }
        for key in self.index.keys() {
            assert!(!self.is_ghost(key), "live key is also a ghost");
            assert!(self.entry(key).is_some_and(|e| &e.key == key));
        }
        self.t1.debug_validate_invariants();
        self.t2.debug_validate_invariants();
        self.b1.debug_validate_invariants();
        self.b2.debug_validate_invariants();
    }
}

impl<K, V> PolicyCore<K, V> for ArcCore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    const NAME: &'static str = "arc";
    const TTL_MODE: TtlMode = TtlMode::Fallback;

    fn new(max_entries: usize) -> Self {
        Self {
            index: FxHashMap::default(),
            t1: IntrusiveList::new(),
            t2: IntrusiveList::new(),
            b1: GhostList::new(max_entries),
            b2: GhostList::new(max_entries),
            p: 0,
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
            if let Some(entry) = self.t2.get_mut(id) {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            return;
        }

        self.adapt_on_ghost(&key);
        if at_capacity(self.index.len(), self.max_entries) {
            self.replace(evicted);
        }
        let id = self.t1.push_front(Entry::new(key.clone(), value, expires_at));
        self.index.insert(key, (ListKind::T1, id));
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        match self.promote(key) {
            Some(id) => self.t2.get(id).map(|entry| &entry.value),
            None => {
                self.adapt_on_ghost(key);
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
        let (kind, id) = self.index.remove(key)?;
        let entry = match kind {
            ListKind::T1 => self.t1.remove(id),
            ListKind::T2 => self.t2.remove(id),
        };
        entry.map(|entry| entry.value)
    }

    fn for_each(&self, f: &mut dyn FnMut(&K, &V, Option<Instant>)) {
        for entry in self.t1.iter().chain(self.t2.iter()) {
            f(&entry.key, &entry.value, entry.expires_at);
        }
    }

    fn drain(&mut self) -> Vec<(K, V, Option<Instant>)> {
        self.index.clear();
        self.b1.clear();
        self.b2.clear();
        self.p = 0;
        let mut out = Vec::with_capacity(self.t1.len() + self.t2.len());
        while let Some(entry) = self.t1.pop_back() {
            out.push(entry.into_parts());
        }
        while let Some(entry) = self.t2.pop_back() {
            out.push(entry.into_parts());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Core = ArcCore<u32, u32>;

    fn set(core: &mut Core, key: u32) -> Vec<u32> {
        let mut evicted = Vec::new();
        core.insert(key, key * 10, None, &mut evicted);
        evicted.into_iter().map(|ev| ev.key).collect()
    }

    mod list_movement {
        use super::*;

        #[test]
        fn new_keys_enter_t1() {
            let mut core = Core::new(4);
            set(&mut core, 1);
            set(&mut core, 2);
            assert_eq!(core.t1_len(), 2);
            assert_eq!(core.t2_len(), 0);
            assert_eq!(core.p(), 0);
        }

        #[test]
        fn get_promotes_to_t2() {
            let mut core = Core::new(4);
            set(&mut core, 1);
            assert_eq!(core.get(&1), Some(&10));
            assert_eq!(core.t1_len(), 0);
            assert_eq!(core.t2_len(), 1);
            assert_eq!(core.get(&1), Some(&10));
            assert_eq!(core.t2_len(), 1);
            core.debug_validate_invariants();
        }

        #[test]
        fn update_promotes_and_replaces_value() {
            let mut core = Core::new(4);
            set(&mut core, 1);
            let mut evicted = Vec::new();
            core.insert(1, 99, None, &mut evicted);
            assert_eq!(core.peek(&1), Some(&99));
            assert_eq!(core.t2_len(), 1);
            assert!(evicted.is_empty());
        }
    }

    mod replacement {
        use super::*;

        #[test]
        fn full_t1_evicts_its_tail_into_b1() {
            let mut core = Core::new(2);
            set(&mut core, 1);
            set(&mut core, 2);
            assert_eq!(set(&mut core, 3), vec![1]);
            assert!(core.is_ghost(&1));
            assert_eq!(core.b1_len(), 1);
            core.debug_validate_invariants();
        }

        #[test]
        fn small_t1_evicts_from_t2() {
            let mut core = Core::new(2);
            set(&mut core, 1);
            set(&mut core, 2);
            core.get(&1);
            core.get(&2);
            assert_eq!(core.t2_len(), 2);

            // |T1| = 0 < max(1, p): evict T2's LRU.
            assert_eq!(set(&mut core, 3), vec![1]);
            assert_eq!(core.b2_len(), 1);
            assert!(core.peek(&3).is_some());
            core.debug_validate_invariants();
        }

        #[test]
        fn ghost_lists_are_bounded() {
            let mut core = Core::new(3);
            for key in 0..50 {
                set(&mut core, key);
            }
            assert!(core.b1_len() <= 3);
            assert_eq!(core.len(), 3);
            core.debug_validate_invariants();
        }
    }

    mod adaptation {
        use super::*;

        #[test]
        fn b1_hit_grows_p() {
            let mut core = Core::new(2);
            set(&mut core, 1);
            set(&mut core, 2);
            set(&mut core, 3);
            assert!(core.is_ghost(&1));

            set(&mut core, 1);
            assert_eq!(core.p(), 1);
            core.debug_validate_invariants();
        }

        #[test]
        fn b2_hit_shrinks_p() {
            let mut core = Core::new(2);
            set(&mut core, 1);
            set(&mut core, 2);
            set(&mut core, 3); // 1 -> B1
            set(&mut core, 1); // p = 1
            core.get(&1); // 1 -> T2
            core.get(&3); // 3 -> T2, T1 empty
            set(&mut core, 4); // |T1| = 0 < 1: T2 tail (1) -> B2
            assert!(core.is_ghost(&1));
            assert_eq!(core.p(), 1);

            set(&mut core, 1);
            assert_eq!(core.p(), 0);
            core.debug_validate_invariants();
        }

        #[test]
        fn get_miss_on_ghost_adapts_and_consumes() {
            let mut core = Core::new(2);
            set(&mut core, 1);
            set(&mut core, 2);
            set(&mut core, 3);
            assert_eq!(core.get(&1), None);
            assert_eq!(core.p(), 1);
            assert!(!core.is_ghost(&1));
        }

        #[test]
        fn p_is_capped_at_max_entries() {
            let mut core = Core::new(2);
            for round in 0..20 {
                for key in 0..4 {
                    set(&mut core, round * 4 + key);
                }
                core.get(&(round * 4));
                core.get(&(round * 4 + 1));
            }
            assert!(core.p() <= 2);
        }
    }

    #[test]
    fn drain_resets_adaptive_state() {
        let mut core = Core::new(2);
        set(&mut core, 1);
        set(&mut core, 2);
        set(&mut core, 3);
        set(&mut core, 1);
        assert!(core.p() > 0);

        assert_eq!(core.drain().len(), 2);
        assert_eq!(core.p(), 0);
        assert_eq!(core.b1_len() + core.b2_len(), 0);
        assert!(core.is_empty());
        core.debug_validate_invariants();
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn p_stays_in_bounds(cap in 1usize..6, ops in prop::collection::vec((0u32..12, 0u8..3), 0..300)) {
                let mut core = Core::new(cap);
                let mut evicted = Vec::new();
                for (key, op) in ops {
                    match op {
                        0 => core.insert(key, key, None, &mut evicted),
                        1 => { core.get(&key); },
                        _ => { core.remove(&key); },
                    }
                    prop_assert!(core.p() <= cap);
                    prop_assert!(core.len() <= cap);
                }
                core.debug_validate_invariants();
            }

            #[test]
            fn b1_hits_never_shrink_p(cap in 2usize..6, keys in prop::collection::vec(0u32..40, 1..100)) {
                let mut core = Core::new(cap);
                let mut evicted = Vec::new();
                for key in keys {
                    let ghost_b1 = core.b1.contains(&key);
                    let before = core.p();
                    core.insert(key, key, None, &mut evicted);
                    if ghost_b1 {
                        prop_assert!(core.p() >= before);
                    }
                }
            }

            #[test]
            fn ghost_hits_move_p_in_their_direction(
                cap in 2usize..6,
                ops in prop::collection::vec((0u32..40, any::<bool>()), 1..200),
            ) {
                let mut core = Core::new(cap);
                let mut evicted = Vec::new();
                for (key, is_set) in ops {
                    let ghost_b1 = core.b1.contains(&key);
                    let ghost_b2 = core.b2.contains(&key);
                    let before = core.p();
                    if is_set {
                        core.insert(key, key, None, &mut evicted);
                    } else {
                        core.get(&key);
                    }
                    if ghost_b1 {
                        prop_assert!(core.p() >= before, "B1 hit shrank p: {} -> {}", before, core.p());
                    }
                    if ghost_b2 {
                        prop_assert!(core.p() <= before, "B2 hit grew p: {} -> {}", before, core.p());
                    }
                    prop_assert!(core.p() <= cap);
                }
                core.debug_validate_invariants();
            }
        }
    }
}
