//! Short-lived cache of counter totals.
//!
//! Summing every shard on each read is the expensive side of a sharded
//! counter. The [`Cache`] holds the last computed total for a short time so
//! that most reads never touch the store.
//!
//! The cache is advisory: it may be empty, stale or unreachable at any time,
//! and a [`ShardedCounter`](crate::counters::ShardedCounter) never lets a
//! [`CacheError`] escape to its callers.
//!
//! # Implementations
//!
//! | Cache | Description |
//! |-------|-------------|
//! | [`MemoryCache`] | In-process map with per-entry expiration |
//! | [`NoCache`] | Always misses; every read goes to the store |

mod memory;
mod no_cache;

pub use memory::MemoryCache;
pub use no_cache::NoCache;

use std::time::Duration;
use thiserror::Error;

/// Errors reported by a [`Cache`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache could not be reached or is otherwise unusable.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// A key-value cache of integers with expiration.
pub trait Cache: Send + Sync {
    /// Returns the value under `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Result<Option<u64>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    fn set(&self, key: &str, value: u64, ttl: Duration) -> Result<(), CacheError>;

    /// Adds `delta` to the value under `key` if, and only if, it is present.
    ///
    /// Returns the new value, or `None` when there was nothing to increment.
    /// An absent entry is never created. The expiration is left unchanged.
    fn increment(&self, key: &str, delta: u64) -> Result<Option<u64>, CacheError>;
}

impl<T: Cache + ?Sized> Cache for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<u64>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: u64, ttl: Duration) -> Result<(), CacheError> {
        (**self).set(key, value, ttl)
    }

    fn increment(&self, key: &str, delta: u64) -> Result<Option<u64>, CacheError> {
        (**self).increment(key, delta)
    }
}
