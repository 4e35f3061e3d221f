pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::cache::{ArcCache, LfuCache, LruCache, PolicyCache, RandomCache, TwoQCache};
pub use crate::error::{ConfigError, ListenerConflictError};
pub use crate::hash_ring::{HashFn, HashRing};
pub use crate::partition::{PartitionConfig, PartitionSnapshot, PartitionedCache};
pub use crate::traits::{Eviction, EvictionCause, EvictionListener, ExpiringCache};
