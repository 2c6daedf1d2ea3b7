//! Snapshot types for serializing counter totals.
//!
//! This module provides serializable snapshot types that capture the totals
//! of a set of counters at one point in time, ready to be exported by an
//! observer or sent over the wire.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! contatori-store = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use contatori_store::cache::MemoryCache;
//! use contatori_store::counters::ShardedCounter;
//! use contatori_store::snapshot::MetricsSnapshot;
//! use contatori_store::store::MemoryStore;
//!
//! let counter = ShardedCounter::new(MemoryStore::new(), MemoryCache::new());
//! counter.increment("requests")?;
//!
//! let snapshot = MetricsSnapshot::collect(&counter, ["requests", "errors"])?;
//! assert_eq!(snapshot.get("requests").map(|c| c.value), Some(1));
//! assert_eq!(snapshot.get("errors").map(|c| c.value), Some(0));
//! # Ok::<(), contatori_store::error::CounterError>(())
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::counters::ShardedCounter;
use crate::error::Result;
use crate::store::Datastore;

/// A snapshot of a single counter.
///
/// # Examples
///
/// ```rust
/// use contatori_store::snapshot::CounterSnapshot;
///
/// let snapshot = CounterSnapshot::new("requests", 42, 20);
///
/// let json = serde_json::to_string(&snapshot).unwrap();
/// assert_eq!(json, r#"{"name":"requests","value":42,"shards":20}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// The name of the counter.
    pub name: String,
    /// The total of the counter, possibly served from the cache.
    pub value: u64,
    /// The configured shard count.
    pub shards: usize,
}

impl CounterSnapshot {
    /// Creates a new counter snapshot.
    pub fn new(name: impl Into<String>, value: u64, shards: usize) -> Self {
        Self {
            name: name.into(),
            value,
            shards,
        }
    }

    /// Reads counter `name` from `counter`.
    pub fn read<S: Datastore, C: Cache>(counter: &ShardedCounter<S, C>, name: &str) -> Result<Self> {
        Ok(Self::new(name, counter.count(name)?, counter.shard_count(name)?))
    }
}

/// A collection of counter snapshots, typically a point-in-time capture of
/// all the counters an application exports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Optional timestamp in milliseconds since Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// The counter snapshots.
    pub counters: Vec<CounterSnapshot>,
}

impl MetricsSnapshot {
    /// Creates a new metrics snapshot with the given counters.
    pub fn new(counters: Vec<CounterSnapshot>) -> Self {
        Self {
            timestamp_ms: None,
            counters,
        }
    }

    /// Creates a new metrics snapshot with counters and a timestamp.
    pub fn with_timestamp(counters: Vec<CounterSnapshot>, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            counters,
        }
    }

    /// Stamps the snapshot with the current wall-clock time.
    pub fn stamped(mut self) -> Self {
        self.timestamp_ms = Some(now_ms());
        self
    }

    /// Finds a counter by name.
    pub fn get(&self, name: &str) -> Option<&CounterSnapshot> {
        self.counters.iter().find(|c| c.name == name)
    }

    /// Reads the named counters from `counter`, in order.
    ///
    /// Fails on the first counter that cannot be read.
    pub fn collect<'a, S: Datastore, C: Cache>(
        counter: &ShardedCounter<S, C>,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let counters = names
            .into_iter()
            .map(|name| CounterSnapshot::read(counter, name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(counters))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
