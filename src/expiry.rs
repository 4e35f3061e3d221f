//! Time-to-live resolution shared by every policy.
//!
//! A `set` carries a requested TTL; `Duration::ZERO` asks for the cache's
//! default. How an explicit TTL interacts with the default depends on the
//! policy's [`TtlMode`]:
//!
//! | requested | default | `Capped`            | `Fallback`          |
//! |-----------|---------|---------------------|---------------------|
//! | 0         | 0       | never expires       | never expires       |
//! | 0         | d       | d                   | d                   |
//! | t         | 0       | t                   | t                   |
//! | t > d     | d       | d                   | t                   |
//! | t <= d    | d       | t                   | t                   |

use std::time::{Duration, Instant};

/// How an explicit TTL relates to a configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlMode {
    /// The default is an upper bound on every TTL (LRU, LFU).
    Capped,
    /// The default only applies when no TTL was given (ARC, 2Q, Random).
    Fallback,
}

/// Turns a requested TTL into an absolute deadline, `None` meaning never.
pub fn resolve_expiration(
    mode: TtlMode,
    requested: Duration,
    default_ttl: Duration,
    now: Instant,
) -> Option<Instant> {
    let has_default = !default_ttl.is_zero();
    let ttl = if requested.is_zero() {
        if !has_default {
            return None;
        }
        default_ttl
    } else if mode == TtlMode::Capped && has_default && requested > default_ttl {
        default_ttl
    } else {
        requested
    };
    // A deadline past the clock's range never arrives.
    now.checked_add(ttl)
}

/// `true` once `now` is strictly past the deadline.
#[inline]
pub fn is_expired(expires_at: Option<Instant>, now: Instant) -> bool {
    matches!(expires_at, Some(deadline) if now > deadline)
}
