//! Deterministic name-to-partition mapping.
//!
//! A partition name is hashed with SHA-256; the 256-bit digest is read as a
//! big-endian unsigned integer and reduced into an inclusive range.
//!
//! ```text
//!   "rule-42" ──sha256──► 0x9f3a…e1 (256-bit) ── mod (max - min + 1) ──► + min
//!                                                                        │
//!                         ┌─────────┬─────────┬─────────┬─────────┐      │
//!                         │ part 1  │ part 2  │ part 3  │ part 4  │ ◄────┘
//!                         └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! The mapping is a pure function of `(name, min, max)`, so every process
//! routes a name to the same partition.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::ds::shard::{hash_to_range, ShardSelector};
//!
//! let p = hash_to_range("user:123", 1, 8);
//! assert!((1..=8).contains(&p));
//! assert_eq!(hash_to_range("user:123", 1, 8), p);
//!
//! let selector = ShardSelector::new(8);
//! assert_eq!(selector.shard_for("user:123"), p);
//! ```

use sha2::{Digest, Sha256};

/// Maps `name` onto `min..=max` through its SHA-256 digest.
///
/// When `max < min` the range collapses to `min`.
pub fn hash_to_range(name: &str, min: usize, max: usize) -> usize {
    let span = max.saturating_sub(min) as u128 + 1;
    let digest = Sha256::digest(name.as_bytes());
    let remainder = digest
        .iter()
        .fold(0u128, |acc, &byte| ((acc << 8) | u128::from(byte)) % span);
    min + remainder as usize
}

/// Routes names onto partitions numbered `1..=shards`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
}

impl ShardSelector {
    /// Creates a selector over `shards` partitions (at least one).
    pub fn new(shards: usize) -> Self {
        Self {
            shards: shards.max(1),
        }
    }

    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Partition number in `1..=shards` for `name`.
    pub fn shard_for(&self, name: &str) -> usize {
        hash_to_range(name, 1, self.shards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_stays_in_range() {
        for i in 0..500 {
            let name = format!("rule-{i}");
            let p = hash_to_range(&name, 1, 7);
            assert!((1..=7).contains(&p), "{name} -> {p}");
        }
    }

    #[test]
    fn deterministic_per_name() {
        assert_eq!(hash_to_range("abc", 10, 20), hash_to_range("abc", 10, 20));
    }

    #[test]
    fn single_slot_range_and_inverted_bounds() {
        assert_eq!(hash_to_range("anything", 5, 5), 5);
        assert_eq!(hash_to_range("anything", 9, 3), 9);
    }

    #[test]
    fn matches_low_bits_for_power_of_two_span() {
        // A big-endian integer mod 256 is its final byte.
        let digest = Sha256::digest(b"hello");
        let last = usize::from(digest[digest.len() - 1]);
        assert_eq!(hash_to_range("hello", 0, 255), last);
    }

    #[test]
    fn selector_spreads_names() {
        let selector = ShardSelector::new(4);
        let mut counts = [0usize; 4];
        for i in 0..4000 {
            counts[selector.shard_for(&format!("k{i}")) - 1] += 1;
        }
        for count in counts {
            assert!(count > 800, "uneven spread: {counts:?}");
        }
    }

    #[test]
    fn selector_has_at_least_one_shard() {
        let selector = ShardSelector::new(0);
        assert_eq!(selector.shards(), 1);
        assert_eq!(selector.shard_for("x"), 1);
    }
}
