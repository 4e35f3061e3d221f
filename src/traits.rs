//! # Cache Contract
//!
//! Every eviction policy in this crate is exposed through the same
//! thread-safe contract, [`ExpiringCache`], and implemented on top of a
//! single-threaded algorithm core, [`PolicyCore`].
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │           ExpiringCache<K, V>  (&self)       │
//!   │  set · get · has · delete · keys · len       │
//!   │  clear · close · set_evicted_listener        │
//!   │  set_default_ttl                             │
//!   └──────────────────────┬───────────────────────┘
//!                          │ implemented by
//!                          ▼
//!   ┌──────────────────────────────────────────────┐
//!   │  PolicyCache<K, V, C>                        │
//!   │    RwLock<core + default TTL>                │
//!   │    listener slot · sweeper                   │
//!   └──────────────────────┬───────────────────────┘
//!                          │ C: PolicyCore<K, V>  (&mut self)
//!        ┌────────┬────────┼────────┬────────────┐
//!        ▼        ▼        ▼        ▼            ▼
//!     LruCore  LfuCore  ArcCore  TwoQCore   RandomCore
//! ```
//!
//! ## Notifications
//!
//! Every removal produces exactly one [`Eviction`] record tagged with an
//! [`EvictionCause`]. Records are gathered while the cache lock is held and
//! handed to the registered [`EvictionListener`] once it is released.
//!
//! | Cause                | Produced by                                 |
//! |----------------------|---------------------------------------------|
//! | `Expired`            | sweeper, `get` of an expired entry          |
//! | `EvictedForCapacity` | `set` of a new key into a full cache        |
//! | `Deleted`            | `delete`                                    |
//! | `Cleared`            | `clear`, `close`                            |

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::ListenerConflictError;
use crate::expiry::TtlMode;

/// Why an entry left a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EvictionCause {
    Expired,
    EvictedForCapacity,
    Deleted,
    Cleared,
}

impl fmt::Display for EvictionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EvictionCause::Expired => "expired",
            EvictionCause::EvictedForCapacity => "evicted",
            EvictionCause::Deleted => "deleted",
            EvictionCause::Cleared => "cleared",
        })
    }
}

/// An entry that has been removed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction<K, V> {
    pub key: K,
    pub value: V,
    pub cause: EvictionCause,
}

impl<K, V> Eviction<K, V> {
    pub fn new(key: K, value: V, cause: EvictionCause) -> Self {
        Self { key, value, cause }
    }
}

/// Receives one call per removed entry.
///
/// Runs on the thread that caused the removal (the caller, or the sweeper
/// thread for `Expired`), after the cache lock has been released.
///
/// Closures implement this trait directly:
///
/// ```
/// use std::sync::Arc;
/// use evictkit::traits::{EvictionCause, EvictionListener};
///
/// let listener: Arc<dyn EvictionListener<String, u32>> =
///     Arc::new(|key: &String, _value: &u32, cause: EvictionCause| {
///         println!("{key} left the cache: {cause}");
///     });
/// # let _ = listener;
/// ```
pub trait EvictionListener<K, V>: Send + Sync {
    fn on_evicted(&self, key: &K, value: &V, cause: EvictionCause);
}

impl<K, V, F> EvictionListener<K, V> for F
where
    F: Fn(&K, &V, EvictionCause) + Send + Sync,
{
    fn on_evicted(&self, key: &K, value: &V, cause: EvictionCause) {
        self(key, value, cause)
    }
}

/// Thread-safe cache with per-entry TTL and eviction notifications.
///
/// A `ttl` of `Duration::ZERO` means "use the default TTL, if any".
/// Expired entries are invisible to `get`, `has`, `keys` and `len` even
/// before the sweeper has removed them.
pub trait ExpiringCache<K, V>: Send + Sync {
    /// Inserts or updates `key`.
    fn set(&self, key: K, value: V, ttl: Duration);

    /// Returns a clone of the live value for `key`.
    fn get(&self, key: &K) -> Option<V>;

    /// `true` if `key` is present and not expired. Never changes ordering.
    fn has(&self, key: &K) -> bool;

    /// Removes `key`; `true` if it was present.
    fn delete(&self, key: &K) -> bool;

    /// Keys of all non-expired entries, in no particular order.
    fn keys(&self) -> Vec<K>;

    /// Number of non-expired entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry, notifying the listener for each.
    fn clear(&self);

    /// Stops background expiry and clears the cache. Safe to call twice.
    fn close(&self);

    /// Registers the eviction listener. A second registration is rejected.
    fn set_evicted_listener(
        &self,
        listener: std::sync::Arc<dyn EvictionListener<K, V>>,
    ) -> Result<(), ListenerConflictError>;

    /// Sets the default TTL; `Duration::ZERO` disables it.
    fn set_default_ttl(&self, ttl: Duration);
}

/// Single-threaded eviction algorithm.
///
/// Cores store entries with an absolute deadline but never consult the
/// clock; expiry decisions belong to the caller. A capacity eviction during
/// `insert` is reported by pushing onto `evicted`.
pub trait PolicyCore<K, V>: Send + Sync + Sized {
    /// Short lowercase policy name used in logs and errors.
    const NAME: &'static str;
    /// How explicit TTLs interact with the default.
    const TTL_MODE: TtlMode;
    /// Whether a read reorders entries (and so needs the exclusive lock).
    const GET_MUTATES: bool = true;

    /// Creates an empty core; `max_entries == 0` means unbounded.
    fn new(max_entries: usize) -> Self;

    fn max_entries(&self) -> usize;

    /// Number of stored entries, expired ones included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts or updates `key`, evicting for capacity first if needed.
    fn insert(
        &mut self,
        key: K,
        value: V,
        expires_at: Option<Instant>,
        evicted: &mut Vec<Eviction<K, V>>,
    );

    /// Looks up `key` and applies the policy's access bookkeeping.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Looks up `key` without touching any ordering.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Deadline of a stored entry: `None` if absent, `Some(None)` if it never expires.
    fn expiry(&self, key: &K) -> Option<Option<Instant>>;

    /// Removes `key` from the live structures without notifying.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Calls `f` for every stored entry.
    fn for_each(&self, f: &mut dyn FnMut(&K, &V, Option<Instant>));

    /// Empties the core, resetting any adaptive state, and returns the entries.
    fn drain(&mut self) -> Vec<(K, V, Option<Instant>)>;
}
