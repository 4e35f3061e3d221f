//! Partitioned cache keyed by name.
//!
//! A fixed set of independent [`Cache`] instances, each with its own lock
//! and sweeper. Every single-key operation hashes the name to one partition;
//! `len`, `keys`, `clear` and `close` fan out to all of them.
//!
//! ```text
//!   "rule-7" ── router(name) ──► 3
//!                                │
//!   ┌─────────┬─────────┬────────▼┬─────────┐
//!   │ part 1  │ part 2  │ part 3  │ part 4  │   each: RwLock + sweeper
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! Partitions are numbered from 1. The routing table never changes after
//! construction, so routing itself takes no lock.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use evictkit::builder::CachePolicy;
//! use evictkit::partition::{PartitionConfig, PartitionedCache};
//!
//! let config = PartitionConfig {
//!     policy: CachePolicy::Lfu,
//!     max_entries: 1_000,
//!     ..PartitionConfig::default()
//! };
//! let cache: PartitionedCache<u32> = PartitionedCache::new(config);
//!
//! cache.set("rule-1", 10, Duration::ZERO);
//! assert_eq!(cache.get("rule-1"), Some(10));
//! assert!(cache.partition_count() >= 1);
//! cache.close();
//! ```

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::builder::{Cache, CacheBuilder, CachePolicy};
use crate::ds::shard::ShardSelector;
use crate::error::ListenerConflictError;
use crate::traits::{EvictionListener, ExpiringCache};

/// Maps a name to a partition number in `1..=partition_count`.
pub type Router = Arc<dyn Fn(&str) -> usize + Send + Sync>;

/// Settings shared by every partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionConfig {
    pub policy: CachePolicy,
    /// Total entry budget split across partitions; 0 means unbounded.
    pub max_entries: usize,
    pub cleanup_interval: Duration,
    pub default_ttl: Duration,
    /// Requested partition count; raised to the available parallelism.
    pub partitions: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicy::Lru,
            max_entries: 0,
            cleanup_interval: Duration::ZERO,
            default_ttl: Duration::ZERO,
            partitions: 1,
        }
    }
}

impl PartitionConfig {
    /// Number of partitions a cache built from this config will have.
    pub fn partition_count(&self) -> usize {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        self.partitions.max(cores).max(1)
    }

    /// Capacity of a single partition out of `count`.
    pub fn per_partition_capacity(&self, count: usize) -> usize {
        if self.max_entries == 0 {
            return 0;
        }
        (self.max_entries / count.max(1)).max(1)
    }
}

/// Point-in-time view of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSnapshot {
    pub index: usize,
    pub len: usize,
    pub keys: Vec<String>,
}

/// Cache spread over independently locked partitions.
pub struct PartitionedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    partitions: Vec<Cache<String, V>>,
    selector: ShardSelector,
    router: Option<Router>,
    config: PartitionConfig,
}

impl<V> PartitionedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Builds the partitions, routing names with a [`ShardSelector`].
    pub fn new(config: PartitionConfig) -> Self {
        Self::build(config, None)
    }

    /// Builds the partitions with a custom router. Results outside
    /// `1..=partition_count` are clamped into range.
    pub fn with_router(config: PartitionConfig, router: Router) -> Self {
        Self::build(config, Some(router))
    }

    fn build(config: PartitionConfig, router: Option<Router>) -> Self {
        let count = config.partition_count();
        let capacity = config.per_partition_capacity(count);
        let builder = CacheBuilder::new(capacity)
            .cleanup_interval(config.cleanup_interval)
            .default_ttl(config.default_ttl);
        let partitions = (0..count).map(|_| builder.build(config.policy)).collect();

        info!(
            policy = %config.policy,
            partitions = count,
            per_partition_capacity = capacity,
            custom_router = router.is_some(),
            "partitioned cache built"
        );
        Self {
            partitions,
            selector: ShardSelector::new(count),
            router,
            config,
        }
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Partition number (from 1) that owns `name`.
    pub fn partition_for(&self, name: &str) -> usize {
        match &self.router {
            Some(router) => router(name).clamp(1, self.selector.shards()),
            None => self.selector.shard_for(name),
        }
    }

    /// Partition number `index` (from 1), if it exists.
    pub fn partition(&self, index: usize) -> Option<&Cache<String, V>> {
        index.checked_sub(1).and_then(|i| self.partitions.get(i))
    }

    fn route(&self, name: &str) -> &Cache<String, V> {
        &self.partitions[self.partition_for(name) - 1]
    }

    pub fn set(&self, name: &str, value: V, ttl: Duration) {
        self.route(name).set(name.to_owned(), value, ttl);
    }

    pub fn get(&self, name: &str) -> Option<V> {
        self.route(name).get(&name.to_owned())
    }

    pub fn has(&self, name: &str) -> bool {
        self.route(name).has(&name.to_owned())
    }

    pub fn delete(&self, name: &str) -> bool {
        self.route(name).delete(&name.to_owned())
    }

    /// Live entries across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(|p| p.is_empty())
    }

    pub fn keys(&self) -> Vec<String> {
        self.partitions.iter().flat_map(|p| p.keys()).collect()
    }

    pub fn clear(&self) {
        for partition in &self.partitions {
            partition.clear();
        }
    }

    pub fn close(&self) {
        for partition in &self.partitions {
            partition.close();
        }
    }

    /// Registers `listener` on every partition.
    ///
    /// Fails on the first partition that already has one; partitions before
    /// it keep the new listener.
    pub fn set_evicted_listener(
        &self,
        listener: Arc<dyn EvictionListener<String, V>>,
    ) -> Result<(), ListenerConflictError> {
        for partition in &self.partitions {
            partition.set_evicted_listener(Arc::clone(&listener))?;
        }
        Ok(())
    }

    pub fn set_default_ttl(&self, ttl: Duration) {
        for partition in &self.partitions {
            partition.set_default_ttl(ttl);
        }
    }

    /// Per-partition sizes and keys, ordered by partition number.
    pub fn snapshot(&self) -> Vec<PartitionSnapshot> {
        self.partitions
            .iter()
            .enumerate()
            .map(|(i, partition)| {
                let mut keys = partition.keys();
                keys.sort_unstable();
                PartitionSnapshot {
                    index: i + 1,
                    len: keys.len(),
                    keys,
                }
            })
            .collect()
    }
}

impl<V> fmt::Debug for PartitionedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedCache")
            .field("config", &self.config)
            .field("partitions", &self.partitions.len())
            .field("custom_router", &self.router.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds::shard::hash_to_range;
    use crate::traits::EvictionCause;
    use parking_lot::Mutex;

    fn config(partitions: usize, max_entries: usize) -> PartitionConfig {
        PartitionConfig {
            max_entries,
            partitions,
            ..PartitionConfig::default()
        }
    }

    #[test]
    fn partition_count_covers_parallelism() {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        assert_eq!(config(0, 0).partition_count(), cores.max(1));
        assert_eq!(config(cores + 3, 0).partition_count(), cores + 3);
    }

    #[test]
    fn capacity_split_never_rounds_to_unbounded() {
        assert_eq!(config(1, 0).per_partition_capacity(8), 0);
        assert_eq!(config(1, 3).per_partition_capacity(8), 1);
        assert_eq!(config(1, 80).per_partition_capacity(8), 10);
        assert_eq!(config(1, 81).per_partition_capacity(8), 10);
    }

    #[test]
    fn routes_names_consistently() {
        let cache: PartitionedCache<u32> = PartitionedCache::new(config(4, 0));
        let n = cache.partition_count();
        for i in 0..100 {
            let name = format!("rule-{i}");
            let p = cache.partition_for(&name);
            assert!((1..=n).contains(&p));
            assert_eq!(p, hash_to_range(&name, 1, n));
            assert_eq!(p, ShardSelector::new(n).shard_for(&name));

            cache.set(&name, i, Duration::ZERO);
            assert!(cache.partition(p).unwrap().has(&name));
        }
        assert_eq!(cache.len(), 100);
        assert!(cache.partition(0).is_none());
        assert!(cache.partition(n + 1).is_none());
    }

    #[test]
    fn custom_router_is_clamped() {
        let cache: PartitionedCache<u8> =
            PartitionedCache::with_router(config(2, 0), Arc::new(|name: &str| name.len() * 100));
        let n = cache.partition_count();
        assert_eq!(cache.partition_for(""), 1);
        assert_eq!(cache.partition_for("abc"), n);

        cache.set("abc", 1, Duration::ZERO);
        assert_eq!(cache.partition(n).unwrap().len(), 1);
    }

    #[test]
    fn single_key_operations_route_through() {
        let cache: PartitionedCache<&'static str> = PartitionedCache::new(config(3, 0));
        cache.set("alpha", "a", Duration::ZERO);
        cache.set("beta", "b", Duration::ZERO);
        assert_eq!(cache.get("alpha"), Some("a"));
        assert!(cache.has("beta"));
        assert!(cache.delete("beta"));
        assert!(!cache.delete("beta"));
        assert_eq!(cache.keys(), vec!["alpha".to_string()]);
    }

    #[test]
    fn listener_is_shared_by_all_partitions() {
        let cache: PartitionedCache<u32> = PartitionedCache::new(config(4, 0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        cache
            .set_evicted_listener(Arc::new(move |k: &String, _: &u32, cause: EvictionCause| {
                sink.lock().push((k.clone(), cause));
            }))
            .unwrap();

        for i in 0..20 {
            cache.set(&format!("k{i}"), i, Duration::ZERO);
        }
        cache.clear();
        assert_eq!(seen.lock().len(), 20);
        assert!(seen.lock().iter().all(|(_, c)| *c == EvictionCause::Cleared));
        assert!(cache.is_empty());

        let again = cache.set_evicted_listener(Arc::new(|_: &String, _: &u32, _: EvictionCause| {}));
        assert!(again.is_err());
    }

    #[test]
    fn snapshot_lists_every_partition() {
        let cache: PartitionedCache<u32> = PartitionedCache::new(config(2, 0));
        for i in 0..10 {
            cache.set(&format!("n{i}"), i, Duration::ZERO);
        }
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), cache.partition_count());
        assert_eq!(snapshot.iter().map(|s| s.len).sum::<usize>(), 10);
        for (i, part) in snapshot.iter().enumerate() {
            assert_eq!(part.index, i + 1);
            assert!(part.keys.windows(2).all(|w| w[0] <= w[1]));
            for key in &part.keys {
                assert_eq!(cache.partition_for(key), part.index);
            }
        }
        cache.close();
        cache.close();
    }
}
