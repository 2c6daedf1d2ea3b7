//! JSON observer for serializing counter totals.
//!
//! This module provides [`JsonObserver`], which serializes a
//! [`MetricsSnapshot`] to JSON using serde.
//!
//! # Feature Flag
//!
//! This module requires the `json` feature:
//!
//! ```toml
//! [dependencies]
//! contatori-store = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use contatori_store::observers::json::JsonObserver;
//! use contatori_store::snapshot::{CounterSnapshot, MetricsSnapshot};
//!
//! let snapshot = MetricsSnapshot::new(vec![
//!     CounterSnapshot::new("http_requests", 1000, 20),
//!     CounterSnapshot::new("http_errors", 5, 20),
//! ]);
//!
//! let json = JsonObserver::new().to_json(&snapshot)?;
//! assert_eq!(
//!     json,
//!     r#"[{"name":"http_requests","value":1000,"shards":20},{"name":"http_errors","value":5,"shards":20}]"#
//! );
//! # Ok::<(), contatori_store::observers::ObserverError>(())
//! ```

use serde::Serialize;

use crate::observers::Result;
use crate::snapshot::MetricsSnapshot;

/// Configuration for the JSON observer.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Whether to pretty-print the JSON output.
    pub pretty: bool,
    /// Whether to stamp the output with the current time, if not already stamped.
    pub include_timestamp: bool,
    /// Whether to emit the whole [`MetricsSnapshot`] object instead of a bare array.
    pub wrap_in_snapshot: bool,
}

/// An observer that serializes counter totals to JSON format.
///
/// By default the output is a bare array of counters. With
/// [`wrap_in_snapshot`](JsonObserver::wrap_in_snapshot) it is the full
/// snapshot object, optionally timestamped.
///
/// ```rust
/// use contatori_store::observers::json::JsonObserver;
/// use contatori_store::snapshot::{CounterSnapshot, MetricsSnapshot};
///
/// let snapshot = MetricsSnapshot::with_timestamp(
///     vec![CounterSnapshot::new("requests", 42, 20)],
///     1700000000000,
/// );
///
/// let json = JsonObserver::new().wrap_in_snapshot(true).to_json(&snapshot)?;
/// assert!(json.starts_with(r#"{"timestamp_ms":1700000000000"#));
/// # Ok::<(), contatori_store::observers::ObserverError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a new JSON observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new JSON observer with the specified configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables timestamp inclusion.
    ///
    /// Only has effect when `wrap_in_snapshot` is also enabled.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Enables or disables wrapping the output in a [`MetricsSnapshot`] object.
    pub fn wrap_in_snapshot(mut self, enabled: bool) -> Self {
        self.config.wrap_in_snapshot = enabled;
        self
    }

    /// Serializes the snapshot to a JSON string.
    pub fn to_json(&self, snapshot: &MetricsSnapshot) -> Result<String> {
        if self.config.wrap_in_snapshot {
            self.encode(&self.stamp(snapshot))
        } else {
            self.encode(&snapshot.counters)
        }
    }

    /// Serializes the snapshot to a JSON byte vector.
    pub fn to_json_bytes(&self, snapshot: &MetricsSnapshot) -> Result<Vec<u8>> {
        Ok(self.to_json(snapshot)?.into_bytes())
    }

    fn stamp(&self, snapshot: &MetricsSnapshot) -> MetricsSnapshot {
        let snapshot = snapshot.clone();
        if self.config.include_timestamp && snapshot.timestamp_ms.is_none() {
            snapshot.stamped()
        } else {
            snapshot
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::counters::ShardedCounter;
    use crate::snapshot::CounterSnapshot;
    use crate::store::MemoryStore;

    fn sample() -> MetricsSnapshot {
        MetricsSnapshot::new(vec![
            CounterSnapshot::new("requests", 1000, 20),
            CounterSnapshot::new("errors", 5, 8),
        ])
    }

    #[test]
    fn test_to_json_empty() {
        let json = JsonObserver::new().to_json(&MetricsSnapshot::new(vec![])).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_to_json_multiple_counters() {
        let json = JsonObserver::new().to_json(&sample()).unwrap();
        assert!(json.contains("requests"));
        assert!(json.contains("1000"));
        assert!(json.contains("errors"));
        assert!(json.starts_with('['));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = JsonObserver::new().pretty(true).to_json(&sample()).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("  "));
    }

    #[test]
    fn test_wrap_in_snapshot() {
        let json = JsonObserver::new()
            .wrap_in_snapshot(true)
            .to_json(&sample())
            .unwrap();
        assert!(json.starts_with(r#"{"counters":["#));
        assert!(!json.contains("timestamp_ms"));
    }

    #[test]
    fn test_include_timestamp() {
        let json = JsonObserver::new()
            .wrap_in_snapshot(true)
            .include_timestamp(true)
            .to_json(&sample())
            .unwrap();
        let parsed: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert!(parsed.timestamp_ms.is_some());
        assert_eq!(parsed.counters, sample().counters);
    }

    #[test]
    fn test_include_timestamp_keeps_existing() {
        let snapshot = MetricsSnapshot::with_timestamp(sample().counters, 42);
        let json = JsonObserver::new()
            .wrap_in_snapshot(true)
            .include_timestamp(true)
            .to_json(&snapshot)
            .unwrap();
        assert!(json.contains(r#""timestamp_ms":42"#));
    }

    #[test]
    fn test_timestamp_ignored_without_wrap() {
        let json = JsonObserver::new()
            .include_timestamp(true)
            .to_json(&sample())
            .unwrap();
        assert!(!json.contains("timestamp_ms"));
    }

    #[test]
    fn test_to_json_bytes() {
        let observer = JsonObserver::new();
        let bytes = observer.to_json_bytes(&sample()).unwrap();
        assert_eq!(bytes, observer.to_json(&sample()).unwrap().into_bytes());
    }

    #[test]
    fn test_with_config() {
        let observer = JsonObserver::with_config(JsonConfig {
            pretty: false,
            include_timestamp: false,
            wrap_in_snapshot: true,
        });
        let json = observer.to_json(&sample()).unwrap();
        assert!(json.starts_with('{'));
    }

    #[test]
    fn test_from_live_counter() {
        let counter = ShardedCounter::new(MemoryStore::new(), MemoryCache::new());
        for _ in 0..3 {
            counter.increment("jobs").unwrap();
        }
        let snapshot = MetricsSnapshot::collect(&counter, ["jobs"]).unwrap();
        let json = JsonObserver::new().to_json(&snapshot).unwrap();
        assert_eq!(json, r#"[{"name":"jobs","value":3,"shards":20}]"#);
    }
}
