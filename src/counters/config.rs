//! Configuration of a [`ShardedCounter`](super::ShardedCounter).
//!
//! Everything that would otherwise be a global constant (record kinds, the
//! default number of shards, the cache lifetime) lives here, so several
//! independently configured counter families can share one store.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::store::Key;

/// Default record kind of shards.
pub const DEFAULT_SHARD_KIND: &str = "GeneralCounterShard";

/// Default record kind of counter configurations.
pub const DEFAULT_CONFIG_KIND: &str = "GeneralCounterShardConfig";

/// Number of shards a counter starts with.
pub const DEFAULT_SHARDS: usize = 20;

/// How long a computed total stays in the cache.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Settings of a [`ShardedCounter`](super::ShardedCounter).
///
/// # Examples
///
/// ```rust
/// use contatori_store::counters::ShardedCounterConfig;
/// use std::time::Duration;
///
/// let config = ShardedCounterConfig::new()
///     .with_shard_kind("PageViewShard")
///     .with_config_kind("PageViewConfig")
///     .with_default_shards(8)
///     .with_cache_ttl(Duration::from_secs(5));
///
/// assert_eq!(config.shard_key("home", 3).name, "home-shard3");
/// assert_eq!(config.cache_key("home"), "PageViewShard:home");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ShardedCounterConfig {
    /// Record kind under which shards are stored.
    pub shard_kind: String,
    /// Record kind under which counter configurations are stored.
    pub config_kind: String,
    /// Shards given to a counter when its configuration is first created.
    pub default_shards: usize,
    /// Lifetime of a cached total.
    pub cache_ttl: Duration,
}

impl Default for ShardedCounterConfig {
    fn default() -> Self {
        Self {
            shard_kind: DEFAULT_SHARD_KIND.to_string(),
            config_kind: DEFAULT_CONFIG_KIND.to_string(),
            default_shards: DEFAULT_SHARDS,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl ShardedCounterConfig {
    /// Creates a configuration with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record kind of shards.
    pub fn with_shard_kind(mut self, kind: impl Into<String>) -> Self {
        self.shard_kind = kind.into();
        self
    }

    /// Sets the record kind of counter configurations.
    pub fn with_config_kind(mut self, kind: impl Into<String>) -> Self {
        self.config_kind = kind.into();
        self
    }

    /// Sets the number of shards new counters start with.
    ///
    /// Zero is treated as one.
    pub fn with_default_shards(mut self, shards: usize) -> Self {
        self.default_shards = shards;
        self
    }

    /// Sets how long a computed total is cached.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Default shard count, never below one.
    pub(crate) fn initial_shards(&self) -> usize {
        self.default_shards.max(1)
    }

    /// Key of the configuration record of counter `name`.
    pub fn config_key(&self, name: &str) -> Key {
        Key::new(&self.config_kind, name)
    }

    /// Key of shard `index` of counter `name`: `"<name>-shard<index>"`.
    pub fn shard_key(&self, name: &str, index: usize) -> Key {
        Key::new(&self.shard_kind, format!("{name}-shard{index}"))
    }

    /// Recovers the shard index from a shard key of counter `name`.
    pub(crate) fn shard_index(&self, name: &str, key: &Key) -> Option<usize> {
        key.name
            .strip_prefix(name)?
            .strip_prefix("-shard")?
            .parse()
            .ok()
    }

    /// Cache key of the total of counter `name`: `"<shard_kind>:<name>"`.
    pub fn cache_key(&self, name: &str) -> String {
        format!("{}:{}", self.shard_kind, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = ShardedCounterConfig::default();
        assert_eq!(config.shard_kind, "GeneralCounterShard");
        assert_eq!(config.config_kind, "GeneralCounterShardConfig");
        assert_eq!(config.default_shards, 20);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_keys() {
        let config = ShardedCounterConfig::new();
        assert_eq!(
            config.config_key("visits"),
            Key::new("GeneralCounterShardConfig", "visits")
        );
        assert_eq!(
            config.shard_key("visits", 7),
            Key::new("GeneralCounterShard", "visits-shard7")
        );
        assert_eq!(config.cache_key("visits"), "GeneralCounterShard:visits");
    }

    #[test]
    fn test_shard_index() {
        let config = ShardedCounterConfig::new();
        let key = config.shard_key("visits", 12);
        assert_eq!(config.shard_index("visits", &key), Some(12));
        assert_eq!(config.shard_index("other", &key), None);
        assert_eq!(
            config.shard_index("visits", &Key::new("GeneralCounterShard", "visits-shardX")),
            None
        );
    }

    #[test]
    fn test_shard_index_nested_name() {
        let config = ShardedCounterConfig::new();
        let key = config.shard_key("a-shard1", 0);
        assert_eq!(key.name, "a-shard1-shard0");
        assert_eq!(config.shard_index("a-shard1", &key), Some(0));
        assert_eq!(config.shard_index("a", &key), None);
    }

    #[test]
    fn test_initial_shards_clamped() {
        let config = ShardedCounterConfig::new().with_default_shards(0);
        assert_eq!(config.initial_shards(), 1);
    }

    #[test]
    fn test_builders() {
        let config = ShardedCounterConfig::new()
            .with_shard_kind("S")
            .with_config_kind("C")
            .with_default_shards(3)
            .with_cache_ttl(Duration::from_millis(5));
        assert_eq!(config.shard_kind, "S");
        assert_eq!(config.config_kind, "C");
        assert_eq!(config.default_shards, 3);
        assert_eq!(config.cache_ttl, Duration::from_millis(5));
    }
}
