//! Unified cache builder for all eviction policies.
//!
//! Picks a policy at run time and hides which core sits underneath. The
//! returned [`Cache`] implements [`ExpiringCache`] by dispatching to the
//! matching [`PolicyCache`](crate::cache::PolicyCache).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use evictkit::builder::{CacheBuilder, CachePolicy};
//! use evictkit::traits::{EvictionCause, ExpiringCache};
//!
//! let cache = CacheBuilder::new(100)
//!     .cleanup_interval(Duration::from_secs(1))
//!     .default_ttl(Duration::from_secs(30))
//!     .build_with_listener::<u64, String>(
//!         "arc".parse().unwrap(),
//!         Arc::new(|key: &u64, _: &String, cause: EvictionCause| {
//!             println!("{key}: {cause}");
//!         }),
//!     );
//!
//! cache.set(1, "hello".to_string(), Duration::ZERO);
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! assert_eq!(cache.policy(), CachePolicy::Arc);
//! cache.close();
//! ```

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{ArcCache, LfuCache, LruCache, RandomCache, TwoQCache};
use crate::error::{ConfigError, ListenerConflictError};
use crate::traits::{EvictionListener, ExpiringCache};

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Least Recently Used eviction.
    #[default]
    Lru,
    /// Least Frequently Used eviction.
    Lfu,
    /// Adaptive Replacement Cache.
    Arc,
    /// Two-queue: FIFO probation plus LRU main queue.
    TwoQ,
    /// Uniformly random victim.
    Random,
}

impl CachePolicy {
    pub const ALL: [CachePolicy; 5] = [
        CachePolicy::Lru,
        CachePolicy::Lfu,
        CachePolicy::Arc,
        CachePolicy::TwoQ,
        CachePolicy::Random,
    ];

    /// Lowercase name, as accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CachePolicy::Lru => "lru",
            CachePolicy::Lfu => "lfu",
            CachePolicy::Arc => "arc",
            CachePolicy::TwoQ => "twoq",
            CachePolicy::Random => "random",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CachePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        CachePolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == name)
            .ok_or_else(|| {
                ConfigError::new(format!(
                    "unknown cache policy {s:?}; expected one of lru, lfu, arc, twoq, random"
                ))
            })
    }
}

/// Cache with a policy chosen at construction time.
pub struct Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
    Arc(ArcCache<K, V>),
    TwoQ(TwoQCache<K, V>),
    Random(RandomCache<K, V>),
}

macro_rules! dispatch {
    ($self:expr, $cache:ident => $body:expr) => {
        match &$self.inner {
            CacheInner::Lru($cache) => $body,
            CacheInner::Lfu($cache) => $body,
            CacheInner::Arc($cache) => $body,
            CacheInner::TwoQ($cache) => $body,
            CacheInner::Random($cache) => $body,
        }
    };
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
            CacheInner::Arc(_) => CachePolicy::Arc,
            CacheInner::TwoQ(_) => CachePolicy::TwoQ,
            CacheInner::Random(_) => CachePolicy::Random,
        }
    }

    pub fn max_entries(&self) -> usize {
        dispatch!(self, c => c.max_entries())
    }

    pub fn default_ttl(&self) -> Duration {
        dispatch!(self, c => c.default_ttl())
    }

    /// `true` while a background sweeper is running.
    pub fn is_sweeping(&self) -> bool {
        dispatch!(self, c => c.is_sweeping())
    }

    /// Runs one expiry sweep on the calling thread.
    pub fn purge_expired(&self) {
        dispatch!(self, c => c.purge_expired())
    }
}

impl<K, V> ExpiringCache<K, V> for Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn set(&self, key: K, value: V, ttl: Duration) {
        dispatch!(self, c => c.set(key, value, ttl))
    }

    fn get(&self, key: &K) -> Option<V> {
        dispatch!(self, c => c.get(key))
    }

    fn has(&self, key: &K) -> bool {
        dispatch!(self, c => c.has(key))
    }

    fn delete(&self, key: &K) -> bool {
        dispatch!(self, c => c.delete(key))
    }

    fn keys(&self) -> Vec<K> {
        dispatch!(self, c => c.keys())
    }

    fn len(&self) -> usize {
        dispatch!(self, c => c.len())
    }

    fn clear(&self) {
        dispatch!(self, c => c.clear())
    }

    fn close(&self) {
        dispatch!(self, c => c.close())
    }

    fn set_evicted_listener(
        &self,
        listener: Arc<dyn EvictionListener<K, V>>,
    ) -> Result<(), ListenerConflictError> {
        dispatch!(self, c => c.set_evicted_listener(listener))
    }

    fn set_default_ttl(&self, ttl: Duration) {
        dispatch!(self, c => c.set_default_ttl(ttl))
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, c => fmt::Debug::fmt(c, f))
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheBuilder {
    max_entries: usize,
    cleanup_interval: Duration,
    default_ttl: Duration,
}

impl CacheBuilder {
    /// Starts a builder for a cache of at most `max_entries` (0 = unbounded).
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            cleanup_interval: Duration::ZERO,
            default_ttl: Duration::ZERO,
        }
    }

    /// Period of the background expiry sweep; zero disables it.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// TTL used when `set` is given `Duration::ZERO`.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Build a cache with the specified policy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use evictkit::builder::{CacheBuilder, CachePolicy};
    /// use evictkit::traits::ExpiringCache;
    ///
    /// for policy in CachePolicy::ALL {
    ///     let cache = CacheBuilder::new(10).build::<u64, u64>(policy);
    ///     cache.set(1, 1, Duration::ZERO);
    ///     assert!(cache.has(&1));
    /// }
    /// ```
    pub fn build<K, V>(self, policy: CachePolicy) -> Cache<K, V>
    where
        K: Clone + Eq + Hash + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let (max, interval) = (self.max_entries, self.cleanup_interval);
        let inner = match policy {
            CachePolicy::Lru => CacheInner::Lru(LruCache::new(max, interval)),
            CachePolicy::Lfu => CacheInner::Lfu(LfuCache::new(max, interval)),
            CachePolicy::Arc => CacheInner::Arc(ArcCache::new(max, interval)),
            CachePolicy::TwoQ => CacheInner::TwoQ(TwoQCache::new(max, interval)),
            CachePolicy::Random => CacheInner::Random(RandomCache::new(max, interval)),
        };
        let cache = Cache { inner };
        cache.set_default_ttl(self.default_ttl);
        cache
    }

    /// Like [`build`](Self::build), with the eviction listener registered
    /// before the cache is handed out.
    pub fn build_with_listener<K, V>(
        self,
        policy: CachePolicy,
        listener: Arc<dyn EvictionListener<K, V>>,
    ) -> Cache<K, V>
    where
        K: Clone + Eq + Hash + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        let cache = self.build(policy);
        let registered = cache.set_evicted_listener(listener);
        debug_assert!(registered.is_ok(), "fresh cache already had a listener");
        cache
    }
}
