//! Thread-safe cache over any [`PolicyCore`].
//!
//! ## Architecture
//!
//! ```text
//!   PolicyCache<K, V, C>
//!   ├── shared: Arc<Shared>
//!   │     ├── state:    RwLock<State { core: C, default_ttl }>
//!   │     └── listener: RwLock<Option<Arc<dyn EvictionListener>>>
//!   └── sweeper: Option<Sweeper> ── holds Weak<Shared>, sweeps every tick
//! ```
//!
//! ## Locking
//!
//! | Operation              | Lock                                        |
//! |------------------------|---------------------------------------------|
//! | `set`, `delete`        | exclusive                                   |
//! | `get`                  | exclusive, shared when `C::GET_MUTATES` is false |
//! | `has`, `len`, `keys`   | shared                                      |
//! | `clear`, sweep tick    | exclusive, once                             |
//!
//! Removals are collected as [`Eviction`] records while the lock is held and
//! delivered to the listener after it is released, so a listener may call
//! back into the same cache.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use evictkit::cache::LruCache;
//! use evictkit::traits::ExpiringCache;
//!
//! let cache: LruCache<String, u32> = LruCache::new(2, Duration::ZERO);
//! cache.set("a".into(), 1, Duration::ZERO);
//! cache.set("b".into(), 2, Duration::from_secs(60));
//! assert_eq!(cache.get(&"a".to_string()), Some(1));
//! assert_eq!(cache.len(), 2);
//! cache.close();
//! ```

use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::error::ListenerConflictError;
use crate::expiry::{is_expired, resolve_expiration};
use crate::policy::{ArcCore, LfuCore, LruCore, RandomCore, TwoQCore};
use crate::sweeper::Sweeper;
use crate::traits::{Eviction, EvictionCause, EvictionListener, ExpiringCache, PolicyCore};

/// Recency-ordered cache.
pub type LruCache<K, V> = PolicyCache<K, V, LruCore<K, V>>;
/// Frequency-ordered cache.
pub type LfuCache<K, V> = PolicyCache<K, V, LfuCore<K, V>>;
/// Adaptive replacement cache.
pub type ArcCache<K, V> = PolicyCache<K, V, ArcCore<K, V>>;
/// Two-queue cache.
pub type TwoQCache<K, V> = PolicyCache<K, V, TwoQCore<K, V>>;
/// Random-eviction cache.
pub type RandomCache<K, V> = PolicyCache<K, V, RandomCore<K, V>>;

type SharedListener<K, V> = Arc<dyn EvictionListener<K, V>>;

struct State<C> {
    core: C,
    default_ttl: Duration,
}

struct Shared<K, V, C> {
    state: RwLock<State<C>>,
    listener: RwLock<Option<SharedListener<K, V>>>,
}

impl<K, V, C> Shared<K, V, C>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: PolicyCore<K, V> + 'static,
{
    fn notify(&self, evicted: Vec<Eviction<K, V>>) {
        if evicted.is_empty() {
            return;
        }
        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            for ev in &evicted {
                listener.on_evicted(&ev.key, &ev.value, ev.cause);
            }
        }
    }

    /// Removes every expired entry under one exclusive lock.
    fn sweep(&self) {
        let evicted = {
            let mut state = self.state.write();
            let now = Instant::now();
            let mut expired = Vec::new();
            state.core.for_each(&mut |key, _, expires_at| {
                if is_expired(expires_at, now) {
                    expired.push(key.clone());
                }
            });
            expired
                .into_iter()
                .filter_map(|key| {
                    let value = state.core.remove(&key)?;
                    Some(Eviction::new(key, value, EvictionCause::Expired))
                })
                .collect::<Vec<_>>()
        };
        if !evicted.is_empty() {
            debug!(policy = C::NAME, removed = evicted.len(), "swept expired entries");
        }
        self.notify(evicted);
    }
}

/// A [`PolicyCore`] behind a reader/writer lock, with TTLs, an eviction
/// listener slot and an optional expiry sweeper.
pub struct PolicyCache<K, V, C> {
    shared: Arc<Shared<K, V, C>>,
    sweeper: Option<Sweeper>,
}

impl<K, V, C> PolicyCache<K, V, C>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: PolicyCore<K, V> + 'static,
{
    /// Creates a cache holding at most `max_entries` (0 = unbounded).
    ///
    /// A nonzero `cleanup_interval` starts a background sweeper.
    pub fn new(max_entries: usize, cleanup_interval: Duration) -> Self {
        Self::with_core(C::new(max_entries), cleanup_interval)
    }

    /// Wraps an already constructed core.
    pub fn with_core(core: C, cleanup_interval: Duration) -> Self {
        let shared = Arc::new(Shared {
            state: RwLock::new(State {
                core,
                default_ttl: Duration::ZERO,
            }),
            listener: RwLock::new(None),
        });

        let sweeper = if cleanup_interval.is_zero() {
            None
        } else {
            let weak: Weak<Shared<K, V, C>> = Arc::downgrade(&shared);
            let spawned = Sweeper::spawn(C::NAME, cleanup_interval, move || match weak.upgrade() {
                Some(shared) => {
                    shared.sweep();
                    true
                },
                None => false,
            });
            match spawned {
                Ok(sweeper) => Some(sweeper),
                Err(err) => {
                    warn!(policy = C::NAME, error = %err, "expiry sweeper not started");
                    None
                },
            }
        };

        Self { shared, sweeper }
    }

    /// Policy name (`"lru"`, `"lfu"`, `"arc"`, `"twoq"`, `"random"`).
    pub fn policy(&self) -> &'static str {
        C::NAME
    }

    pub fn max_entries(&self) -> usize {
        self.shared.state.read().core.max_entries()
    }

    pub fn default_ttl(&self) -> Duration {
        self.shared.state.read().default_ttl
    }

    /// `true` while the background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(Sweeper::is_running)
    }

    /// Runs one expiry sweep on the calling thread.
    pub fn purge_expired(&self) {
        self.shared.sweep();
    }

    /// Runs `f` against the core under the shared lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.shared.state.read().core)
    }

    fn count_live(core: &C, now: Instant) -> usize {
        let mut live = 0;
        core.for_each(&mut |_, _, expires_at| {
            if !is_expired(expires_at, now) {
                live += 1;
            }
        });
        live
    }
}

impl<K, V, C> ExpiringCache<K, V> for PolicyCache<K, V, C>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: PolicyCore<K, V> + 'static,
{
    fn set(&self, key: K, value: V, ttl: Duration) {
        let mut evicted = Vec::new();
        {
            let mut state = self.shared.state.write();
            let expires_at = resolve_expiration(C::TTL_MODE, ttl, state.default_ttl, Instant::now());
            state.core.insert(key, value, expires_at, &mut evicted);
        }
        if !evicted.is_empty() {
            trace!(policy = C::NAME, count = evicted.len(), "evicted for capacity");
        }
        self.shared.notify(evicted);
    }

    fn get(&self, key: &K) -> Option<V> {
        if !C::GET_MUTATES {
            let state = self.shared.state.read();
            if is_expired(state.core.expiry(key)?, Instant::now()) {
                return None;
            }
            return state.core.peek(key).cloned();
        }

        let mut evicted = Vec::new();
        let value = {
            let mut state = self.shared.state.write();
            match state.core.expiry(key) {
                Some(expires_at) if is_expired(expires_at, Instant::now()) => {
                    if let Some(value) = state.core.remove(key) {
                        evicted.push(Eviction::new(key.clone(), value, EvictionCause::Expired));
                    }
                    None
                },
                _ => state.core.get(key).cloned(),
            }
        };
        self.shared.notify(evicted);
        value
    }

    fn has(&self, key: &K) -> bool {
        let state = self.shared.state.read();
        matches!(state.core.expiry(key), Some(expires_at) if !is_expired(expires_at, Instant::now()))
    }

    fn delete(&self, key: &K) -> bool {
        let removed = self.shared.state.write().core.remove(key);
        match removed {
            Some(value) => {
                self.shared
                    .notify(vec![Eviction::new(key.clone(), value, EvictionCause::Deleted)]);
                true
            },
            None => false,
        }
    }

    fn keys(&self) -> Vec<K> {
        let state = self.shared.state.read();
        let now = Instant::now();
        let mut keys = Vec::new();
        state.core.for_each(&mut |key, _, expires_at| {
            if !is_expired(expires_at, now) {
                keys.push(key.clone());
            }
        });
        keys
    }

    fn len(&self) -> usize {
        let state = self.shared.state.read();
        Self::count_live(&state.core, Instant::now())
    }

    fn clear(&self) {
        let evicted: Vec<_> = {
            let mut state = self.shared.state.write();
            let now = Instant::now();
            state
                .core
                .drain()
                .into_iter()
                .map(|(key, value, expires_at)| {
                    let cause = if is_expired(expires_at, now) {
                        EvictionCause::Expired
                    } else {
                        EvictionCause::Cleared
                    };
                    Eviction::new(key, value, cause)
                })
                .collect()
        };
        debug!(policy = C::NAME, removed = evicted.len(), "cache cleared");
        self.shared.notify(evicted);
    }

    fn close(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
        self.clear();
    }

    fn set_evicted_listener(
        &self,
        listener: Arc<dyn EvictionListener<K, V>>,
    ) -> Result<(), ListenerConflictError> {
        let mut slot = self.shared.listener.write();
        if slot.is_some() {
            return Err(ListenerConflictError::new(C::NAME));
        }
        *slot = Some(listener);
        Ok(())
    }

    fn set_default_ttl(&self, ttl: Duration) {
        self.shared.state.write().default_ttl = ttl;
    }
}

impl<K, V, C> Drop for PolicyCache<K, V, C> {
    fn drop(&mut self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }
}

impl<K, V, C> std::fmt::Debug for PolicyCache<K, V, C>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: PolicyCore<K, V> + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("PolicyCache")
            .field("policy", &C::NAME)
            .field("max_entries", &state.core.max_entries())
            .field("stored", &state.core.len())
            .field("default_ttl", &state.default_ttl)
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}
