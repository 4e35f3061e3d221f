//! evictkit: thread-safe expiring caches with pluggable eviction policies,
//! a consistent hash ring, and a name-partitioned cache router.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod cache;
pub mod ds;
pub mod error;
pub mod expiry;
pub mod hash_ring;
pub mod partition;
pub mod policy;
pub mod sweeper;
pub mod traits;

pub mod prelude;
