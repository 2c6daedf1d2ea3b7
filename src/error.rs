//! Error type for counter operations.

use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by [`ShardedCounter`](crate::counters::ShardedCounter).
///
/// Store failures pass through untouched. Cache failures never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// The durable store failed; the operation may have partially applied.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Counter names must not be empty.
    #[error("counter name is empty")]
    EmptyName,

    /// A shard count must be at least one.
    #[error("invalid shard count: {0}")]
    InvalidShardCount(usize),
}

/// Result type for counter operations.
pub type Result<T> = std::result::Result<T, CounterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_transparent() {
        let store = StoreError::Unavailable("down".to_string());
        let err = CounterError::from(store.clone());
        assert_eq!(err.to_string(), store.to_string());
    }
}
