//! A cache that never holds anything.

use std::time::Duration;

use super::{Cache, CacheError};

/// A [`Cache`] that always misses.
///
/// With `NoCache` every [`count`](crate::counters::ShardedCounter::count)
/// sums the shards in the store, so reads are always up to date.
///
/// # Examples
///
/// ```rust
/// use contatori_store::cache::{Cache, NoCache};
/// use std::time::Duration;
///
/// let cache = NoCache;
/// cache.set("hits", 10, Duration::from_secs(60))?;
/// assert_eq!(cache.get("hits")?, None);
/// # Ok::<(), contatori_store::cache::CacheError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    #[inline]
    fn get(&self, _key: &str) -> Result<Option<u64>, CacheError> {
        Ok(None)
    }

    #[inline]
    fn set(&self, _key: &str, _value: u64, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    #[inline]
    fn increment(&self, _key: &str, _delta: u64) -> Result<Option<u64>, CacheError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_misses() {
        let cache = NoCache;
        cache.set("a", 1, Duration::from_secs(1)).unwrap();
        assert_eq!(cache.get("a").unwrap(), None);
        assert_eq!(cache.increment("a", 1).unwrap(), None);
    }
}
