//! Durable storage contract for counter configurations and shards.
//!
//! A [`ShardedCounter`](crate::counters::ShardedCounter) keeps nothing in
//! memory: every configuration and every shard lives in a [`Datastore`].
//! The only concurrency control the counter relies on is the store's
//! single-key transactional read-modify-write, exposed as
//! [`Datastore::update`].
//!
//! # Data Layout
//!
//! ```text
//!   kind                          name                  record
//!   ─────────────────────────────────────────────────────────────────────
//!   GeneralCounterShardConfig     visits                Config { shard_count: 20 }
//!   GeneralCounterShard           visits-shard3         Shard  { name: "visits", count: 41 }
//!   GeneralCounterShard           visits-shard17        Shard  { name: "visits", count: 38 }
//! ```
//!
//! Shard records carry a redundant copy of the counter name so that all the
//! shards of a counter can be found with a single [`Datastore::query`].
//!
//! # Implementations
//!
//! | Store | Description |
//! |-------|-------------|
//! | [`MemoryStore`] | In-process, lock-striped map, for tests and single-process hosts |
//!
//! Any transactional key-value or document store can back a counter by
//! implementing the four methods of [`Datastore`].

mod memory;

pub use memory::MemoryStore;

use std::fmt::{self, Display};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors reported by a [`Datastore`].
///
/// These are surfaced unchanged to callers of the counter operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or is otherwise unusable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The transaction was aborted (contention, deadline, explicit abort).
    #[error("transaction aborted: {0}")]
    Aborted(String),

    /// A record of the wrong type was found under a key.
    #[error("unexpected record under {key}: expected {expected}")]
    Unexpected {
        /// The offending key.
        key: Key,
        /// The record type that was expected.
        expected: &'static str,
    },
}

/// Identifies a single record: a kind (table, collection) and a name within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Key {
    /// The record kind.
    pub kind: String,
    /// The record name, unique within its kind.
    pub name: String,
}

impl Key {
    /// Creates a new key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contatori_store::store::Key;
    ///
    /// let key = Key::new("GeneralCounterShard", "visits-shard3");
    /// assert_eq!(key.to_string(), "GeneralCounterShard/visits-shard3");
    /// ```
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// How many shards a counter is spread over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfigRecord {
    /// Upper bound (exclusive) of the shard indices picked on increment.
    pub shard_count: usize,
}

/// One slice of a counter's total.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShardRecord {
    /// Name of the counter this shard belongs to.
    pub name: String,
    /// Increments committed to this shard.
    pub count: u64,
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Record {
    /// A counter configuration.
    Config(ConfigRecord),
    /// A counter shard.
    Shard(ShardRecord),
}

impl Record {
    /// Returns the `name` field used by [`Datastore::query`], if the record has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Record::Config(_) => None,
            Record::Shard(shard) => Some(&shard.name),
        }
    }
}

/// Closure run inside a single-key transaction.
///
/// It receives the current record (`None` if absent) and returns the record
/// to commit. Returning an error aborts the transaction.
pub type UpdateFn<'a> = dyn FnMut(Option<Record>) -> Result<Record, StoreError> + 'a;

/// A durable key-value store with single-key transactions.
///
/// Implementations must be safe to share across threads: the counter is
/// called concurrently and performs no locking of its own.
pub trait Datastore: Send + Sync {
    /// Reads the record stored under `key`.
    fn get(&self, key: &Key) -> Result<Option<Record>, StoreError>;

    /// Writes `record` under `key`, replacing any previous record.
    fn put(&self, key: &Key, record: Record) -> Result<(), StoreError>;

    /// Returns every record of `kind` whose `name` field equals `name`.
    ///
    /// The order of the returned records is unspecified.
    fn query(&self, kind: &str, name: &str) -> Result<Vec<(Key, Record)>, StoreError>;

    /// Atomically reads, transforms and writes back the record under `key`.
    ///
    /// No other update of the same key may interleave between the read and
    /// the write. Stores that resolve conflicts optimistically may invoke `f`
    /// more than once; only the last invocation is committed. The committed
    /// record is returned.
    fn update(&self, key: &Key, f: &mut UpdateFn<'_>) -> Result<Record, StoreError>;
}

impl<T: Datastore + ?Sized> Datastore for std::sync::Arc<T> {
    fn get(&self, key: &Key) -> Result<Option<Record>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &Key, record: Record) -> Result<(), StoreError> {
        (**self).put(key, record)
    }

    fn query(&self, kind: &str, name: &str) -> Result<Vec<(Key, Record)>, StoreError> {
        (**self).query(kind, name)
    }

    fn update(&self, key: &Key, f: &mut UpdateFn<'_>) -> Result<Record, StoreError> {
        (**self).update(key, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = Key::new("kind", "name");
        assert_eq!(key.to_string(), "kind/name");
    }

    #[test]
    fn test_record_name() {
        let config = Record::Config(ConfigRecord { shard_count: 3 });
        let shard = Record::Shard(ShardRecord {
            name: "visits".to_string(),
            count: 1,
        });
        assert_eq!(config.name(), None);
        assert_eq!(shard.name(), Some("visits"));
    }

    #[test]
    fn test_unexpected_display() {
        let err = StoreError::Unexpected {
            key: Key::new("k", "n"),
            expected: "shard",
        };
        assert_eq!(err.to_string(), "unexpected record under k/n: expected shard");
    }
}
