//! Eviction algorithm cores.
//!
//! Each module implements [`PolicyCore`](crate::traits::PolicyCore) for one
//! replacement strategy. Cores are single-threaded and clock-free; wrap one
//! in [`PolicyCache`](crate::cache::PolicyCache) to get locking, TTLs and
//! notifications.
//!
//! | Policy  | Core         | Victim                                   |
//! |---------|--------------|------------------------------------------|
//! | LRU     | `LruCore`    | least recently used                      |
//! | LFU     | `LfuCore`    | oldest entry among the least frequent    |
//! | ARC     | `ArcCore`    | T1 or T2 tail, steered by ghost hits     |
//! | 2Q      | `TwoQCore`   | A1 tail first, then A2 tail              |
//! | Random  | `RandomCore` | uniformly random                         |

use std::time::Instant;

pub mod arc;
pub mod lfu;
pub mod lru;
pub mod random;
pub mod two_q;

pub use arc::ArcCore;
pub use lfu::LfuCore;
pub use lru::LruCore;
pub use random::RandomCore;
pub use two_q::TwoQCore;

/// A stored key/value pair with its deadline.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) expires_at: Option<Instant>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            expires_at,
        }
    }

    pub(crate) fn into_parts(self) -> (K, V, Option<Instant>) {
        (self.key, self.value, self.expires_at)
    }
}

/// `true` when a bounded core has no room for one more key.
#[inline]
pub(crate) fn at_capacity(len: usize, max_entries: usize) -> bool {
    max_entries != 0 && len >= max_entries
}
