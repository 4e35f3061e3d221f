//! Consistent hash ring.
//!
//! Each physical node owns `replicas` virtual points on a 32-bit ring. A key
//! belongs to the node owning the first point at or after the key's hash,
//! wrapping to the lowest point past the top of the ring.
//!
//! ```text
//!                 0 ──────────────────────────────► u32::MAX
//!   points:       │  a0     b2   c1      a2  b0    c0  a1  b1│
//!                 │   ▲                                      │
//!   hash(key) ────┘   └── first point ≥ hash → owner "a"     │
//!   hash(key) > last point ──────────── wraps to first point ┘
//! ```
//!
//! Removing a node deletes only its own points, so on average `1/N` of the
//! keys change owner. Points are hashed with MD5 unless a custom hash is
//! supplied.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::hash_ring::HashRing;
//!
//! let ring = HashRing::new(16, None).unwrap();
//! ring.add_node("cache-a");
//! ring.add_node("cache-b");
//!
//! let owner = ring.get_node("user:42").unwrap();
//! assert!(owner == "cache-a" || owner == "cache-b");
//! assert_eq!(ring.get_node("user:42").as_deref(), Some(owner.as_str()));
//! ```

use std::fmt;
use std::sync::Arc;

use md5::{Digest, Md5};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::ConfigError;

/// Pluggable 32-bit hash used for both node points and keys.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Top four bytes of the MD5 digest, big-endian.
pub fn default_hash(data: &[u8]) -> u32 {
    let digest = Md5::digest(data);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Ring points as `(hash, owner)`, sorted by hash then owner. Colliding
/// hashes from different nodes are all kept.
#[derive(Default)]
struct RingState {
    points: Vec<(u32, String)>,
    nodes: FxHashSet<String>,
}

/// Thread-safe consistent hash ring with virtual nodes.
pub struct HashRing {
    replicas: usize,
    hash: HashFn,
    state: RwLock<RingState>,
}

impl HashRing {
    /// Creates an empty ring; `hash` defaults to [`default_hash`].
    ///
    /// Fails when `replicas` is zero.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Result<Self, ConfigError> {
        if replicas == 0 {
            return Err(ConfigError::new("hash ring needs at least one replica per node"));
        }
        Ok(Self {
            replicas,
            hash: hash.unwrap_or_else(|| Arc::new(default_hash)),
            state: RwLock::new(RingState::default()),
        })
    }

    pub fn replicas(&self) -> usize {
        self.replicas
    }

    fn virtual_key(node: &str, replica: usize) -> String {
        format!("{node}{replica}")
    }

    /// Adds `node` with its virtual points. Adding a known node does nothing.
    ///
    /// A point whose hash collides with another node's is still recorded;
    /// lookups resolve the tie by node name, so the ring depends only on its
    /// membership, never on insertion order.
    pub fn add_node(&self, node: &str) {
        let mut state = self.state.write();
        if state.nodes.contains(node) {
            return;
        }
        for replica in 0..self.replicas {
            let point = (self.hash)(Self::virtual_key(node, replica).as_bytes());
            state.points.push((point, node.to_owned()));
        }
        state.points.sort_unstable();
        state.nodes.insert(node.to_owned());
        debug!(node, points = state.points.len(), "hash ring node added");
    }

    /// Removes `node` and only its own points. Returns `false` if unknown.
    pub fn remove_node(&self, node: &str) -> bool {
        let mut state = self.state.write();
        if !state.nodes.remove(node) {
            return false;
        }
        state.points.retain(|(_, owner)| owner != node);
        debug!(node, points = state.points.len(), "hash ring node removed");
        true
    }

    /// Owner of `key`, or `None` on an empty ring.
    pub fn get_node(&self, key: &str) -> Option<String> {
        let state = self.state.read();
        if state.points.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = state.points.partition_point(|(point, _)| *point < hash);
        let (_, owner) = &state.points[idx % state.points.len()];
        Some(owner.clone())
    }

    /// Physical nodes, sorted by name.
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.state.read().nodes.iter().cloned().collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn virtual_node_count(&self) -> usize {
        self.state.read().points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }

    /// Number of virtual points owned by each node.
    pub fn node_stats(&self) -> FxHashMap<String, usize> {
        let state = self.state.read();
        let mut stats: FxHashMap<String, usize> =
            state.nodes.iter().map(|node| (node.clone(), 0)).collect();
        for (_, owner) in &state.points {
            if let Some(count) = stats.get_mut(owner) {
                *count += 1;
            }
        }
        stats
    }
}

impl fmt::Display for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        write!(
            f,
            "HashRing{{nodes={}, virtual_nodes={}, replicas={}}}",
            state.nodes.len(),
            state.points.len(),
            self.replicas
        )
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
