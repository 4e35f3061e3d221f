//! Error types for the evictkit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when configuration parameters are invalid
//!   (unknown policy name, a hash ring without replicas).
//! - [`ListenerConflictError`]: Returned when an eviction listener is
//!   registered on a cache that already has one.
//!
//! Absence of a key, an expired entry, or an empty ring are ordinary outcomes
//! and are reported through `Option`/`bool`, never through these types.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::builder::CachePolicy;
//! use evictkit::error::ConfigError;
//!
//! let policy: Result<CachePolicy, ConfigError> = "arc".parse();
//! assert!(policy.is_ok());
//!
//! let bad = "mru".parse::<CachePolicy>();
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when configuration parameters are invalid.
///
/// Carries a human-readable description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use evictkit::builder::CachePolicy;
///
/// let err = "clock".parse::<CachePolicy>().unwrap_err();
/// assert!(err.to_string().contains("clock"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// ListenerConflictError
// ---------------------------------------------------------------------------

/// Error returned by `set_evicted_listener` when a listener is already
/// registered. The existing listener stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConflictError {
    policy: &'static str,
}

impl ListenerConflictError {
    /// Creates a conflict error for the named policy (`"lru"`, `"arc"`, ...).
    #[inline]
    pub fn new(policy: &'static str) -> Self {
        Self { policy }
    }

    /// Returns the name of the policy whose listener slot was occupied.
    #[inline]
    pub fn policy(&self) -> &'static str {
        self.policy
    }
}

impl fmt::Display for ListenerConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cache eviction listener is already set", self.policy)
    }
}

impl std::error::Error for ListenerConflictError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("replicas must be > 0");
        assert_eq!(err.to_string(), "replicas must be > 0");
    }

    #[test]
    fn config_debug_includes_message() {
        let err = ConfigError::new("unknown policy");
        let dbg = format!("{:?}", err);
        assert!(dbg.contains("unknown policy"));
    }

    #[test]
    fn config_message_accessor() {
        let err = ConfigError::new("test");
        assert_eq!(err.message(), "test");
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }

    // -- ListenerConflictError --------------------------------------------

    #[test]
    fn listener_conflict_names_policy() {
        let err = ListenerConflictError::new("lfu");
        assert_eq!(err.to_string(), "lfu cache eviction listener is already set");
        assert_eq!(err.policy(), "lfu");
    }

    #[test]
    fn listener_conflict_clone_and_eq() {
        let a = ListenerConflictError::new("arc");
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, ListenerConflictError::new("twoq"));
    }

    #[test]
    fn listener_conflict_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<ListenerConflictError>();
    }
}
