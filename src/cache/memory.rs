//! In-process cache with per-entry expiration.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{Cache, CacheError};

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: u64,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// A mutex-guarded map of integers, each with its own deadline.
///
/// Expired entries behave exactly like absent ones and are dropped lazily
/// the next time their key is touched.
///
/// # Examples
///
/// ```rust
/// use contatori_store::cache::{Cache, MemoryCache};
/// use std::time::Duration;
///
/// let cache = MemoryCache::new();
///
/// // Nothing to increment yet: no entry is created.
/// assert_eq!(cache.increment("hits", 1)?, None);
/// assert_eq!(cache.get("hits")?, None);
///
/// cache.set("hits", 10, Duration::from_secs(60))?;
/// assert_eq!(cache.increment("hits", 1)?, Some(11));
/// assert_eq!(cache.get("hits")?, Some(11));
/// # Ok::<(), contatori_store::cache::CacheError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry, live or expired.
    pub fn flush(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Drops the entry under `key`, if any.
    pub fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory cache poisoned".to_string()))
    }

    /// Returns the live entry under `key`, removing it if it has expired.
    fn live_entry<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
    ) -> Option<&'a mut Entry> {
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<u64>, CacheError> {
        let mut entries = self.entries()?;
        Ok(Self::live_entry(&mut entries, key).map(|entry| entry.value))
    }

    fn set(&self, key: &str, value: u64, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.entries()?
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    fn increment(&self, key: &str, delta: u64) -> Result<Option<u64>, CacheError> {
        let mut entries = self.entries()?;
        Ok(Self::live_entry(&mut entries, key).map(|entry| {
            entry.value = entry.value.wrapping_add(delta);
            entry.value
        }))
    }
}
