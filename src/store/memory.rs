//! In-process transactional store.
//!
//! [`MemoryStore`] partitions its key space over a fixed number of lock
//! stripes. A key always hashes to the same stripe, so an
//! [`update`](Datastore::update) holds that stripe's lock for the whole
//! read-modify-write and concurrent updates of one key are serialized.
//! Updates of keys living on different stripes run in parallel.
//!
//! ```text
//!   update("visits-shard3") ──hash──►  [Stripe 11] Mutex<HashMap> (CachePadded)
//!   update("visits-shard9") ──hash──►  [Stripe 40] Mutex<HashMap> (CachePadded)
//!   query("visits")         ────────►  every stripe, one at a time
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use crossbeam_utils::CachePadded;

use super::{Datastore, Key, Record, StoreError, UpdateFn};

/// Number of lock stripes.
///
/// Each stripe is cache-line padded so that threads locking neighbouring
/// stripes do not invalidate each other's lines.
const NUM_STRIPES: usize = 64;

type Stripe = CachePadded<Mutex<HashMap<Key, Record>>>;

/// A lock-striped, in-memory [`Datastore`].
///
/// # Examples
///
/// ```rust
/// use contatori_store::store::{ConfigRecord, Datastore, Key, MemoryStore, Record};
///
/// let store = MemoryStore::new();
/// let key = Key::new("GeneralCounterShardConfig", "visits");
///
/// let committed = store.update(&key, &mut |current| {
///     let mut config = match current {
///         Some(Record::Config(config)) => config,
///         _ => ConfigRecord { shard_count: 20 },
///     };
///     config.shard_count += 1;
///     Ok(Record::Config(config))
/// })?;
///
/// assert_eq!(committed, Record::Config(ConfigRecord { shard_count: 21 }));
/// assert_eq!(store.get(&key)?, Some(committed));
/// # Ok::<(), contatori_store::store::StoreError>(())
/// ```
pub struct MemoryStore {
    stripes: Box<[Stripe]>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let stripes: Vec<Stripe> = (0..NUM_STRIPES)
            .map(|_| CachePadded::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            stripes: stripes.into_boxed_slice(),
        }
    }

    /// Returns the total number of records held.
    ///
    /// Poisoned stripes are skipped.
    pub fn len(&self) -> usize {
        self.stripes
            .iter()
            .filter_map(|stripe| stripe.lock().ok())
            .map(|map| map.len())
            .sum()
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stripe(&self, key: &Key) -> Result<MutexGuard<'_, HashMap<Key, Record>>, StoreError> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.stripes.len();
        lock(&self.stripes[idx])
    }
}

fn lock(stripe: &Stripe) -> Result<MutexGuard<'_, HashMap<Key, Record>>, StoreError> {
    stripe
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store stripe poisoned".to_string()))
}

impl Datastore for MemoryStore {
    fn get(&self, key: &Key) -> Result<Option<Record>, StoreError> {
        Ok(self.stripe(key)?.get(key).cloned())
    }

    fn put(&self, key: &Key, record: Record) -> Result<(), StoreError> {
        self.stripe(key)?.insert(key.clone(), record);
        Ok(())
    }

    fn query(&self, kind: &str, name: &str) -> Result<Vec<(Key, Record)>, StoreError> {
        let mut found = Vec::new();
        for stripe in self.stripes.iter() {
            let map = lock(stripe)?;
            found.extend(
                map.iter()
                    .filter(|(key, record)| key.kind == kind && record.name() == Some(name))
                    .map(|(key, record)| (key.clone(), record.clone())),
            );
        }
        Ok(found)
    }

    fn update(&self, key: &Key, f: &mut UpdateFn<'_>) -> Result<Record, StoreError> {
        let mut map = self.stripe(key)?;
        let next = f(map.get(key).cloned())?;
        map.insert(key.clone(), next.clone());
        Ok(next)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MemoryStore {
    /// Formats the store showing the number of records per non-empty stripe.
    ///
    /// Output format: `MemoryStore{ [stripe]:records ... }`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryStore{{")?;
        for (i, stripe) in self.stripes.iter().enumerate() {
            if let Ok(map) = stripe.lock() {
                if !map.is_empty() {
                    write!(f, " [{i}]:{}", map.len())?;
                }
            }
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ConfigRecord, ShardRecord};
    use std::sync::Arc;
    use std::thread;

    fn shard(name: &str, count: u64) -> Record {
        Record::Shard(ShardRecord {
            name: name.to_string(),
            count,
        })
    }

    fn bump(current: Option<Record>) -> Result<Record, StoreError> {
        match current {
            None => Ok(shard("c", 1)),
            Some(Record::Shard(s)) => Ok(shard(&s.name, s.count + 1)),
            Some(_) => Err(StoreError::Aborted("not a shard".to_string())),
        }
    }

    #[test]
    fn test_new_is_empty() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&Key::new("k", "missing")).unwrap(), None);
    }

    #[test]
    fn test_put_get() {
        let store = MemoryStore::new();
        let key = Key::new("k", "a");
        store.put(&key, shard("a", 7)).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(shard("a", 7)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_replaces() {
        let store = MemoryStore::new();
        let key = Key::new("k", "a");
        store.put(&key, shard("a", 1)).unwrap();
        store.put(&key, shard("a", 2)).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(shard("a", 2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_same_name_different_kind() {
        let store = MemoryStore::new();
        store.put(&Key::new("one", "a"), shard("a", 1)).unwrap();
        store.put(&Key::new("two", "a"), shard("a", 2)).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&Key::new("one", "a")).unwrap(), Some(shard("a", 1)));
    }

    #[test]
    fn test_query_filters_kind_and_name() {
        let store = MemoryStore::new();
        store.put(&Key::new("shard", "a-shard0"), shard("a", 1)).unwrap();
        store.put(&Key::new("shard", "a-shard1"), shard("a", 2)).unwrap();
        store.put(&Key::new("shard", "b-shard0"), shard("b", 3)).unwrap();
        store.put(&Key::new("other", "a-shard0"), shard("a", 4)).unwrap();
        store
            .put(&Key::new("shard", "a"), Record::Config(ConfigRecord { shard_count: 5 }))
            .unwrap();

        let mut found = store.query("shard", "a").unwrap();
        found.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(
            found,
            vec![
                (Key::new("shard", "a-shard0"), shard("a", 1)),
                (Key::new("shard", "a-shard1"), shard("a", 2)),
            ]
        );
    }

    #[test]
    fn test_query_no_match() {
        let store = MemoryStore::new();
        assert!(store.query("shard", "nothing").unwrap().is_empty());
    }

    #[test]
    fn test_update_initializes() {
        let store = MemoryStore::new();
        let key = Key::new("k", "c");
        let committed = store.update(&key, &mut bump).unwrap();
        assert_eq!(committed, shard("c", 1));
        assert_eq!(store.get(&key).unwrap(), Some(shard("c", 1)));
    }

    #[test]
    fn test_update_error_leaves_record() {
        let store = MemoryStore::new();
        let key = Key::new("k", "c");
        let config = Record::Config(ConfigRecord { shard_count: 2 });
        store.put(&key, config.clone()).unwrap();

        let result = store.update(&key, &mut bump);
        assert_eq!(result, Err(StoreError::Aborted("not a shard".to_string())));
        assert_eq!(store.get(&key).unwrap(), Some(config));
    }

    #[test]
    fn test_update_no_lost_updates() {
        let store = Arc::new(MemoryStore::new());
        let key = Key::new("k", "c");
        let mut handles = vec![];

        for _ in 0..8 {
            let store = Arc::clone(&store);
            let key = key.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..250 {
                    store.update(&key, &mut bump).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get(&key).unwrap(), Some(shard("c", 2000)));
    }

    #[test]
    fn test_debug() {
        let store = MemoryStore::new();
        store.put(&Key::new("k", "a"), shard("a", 1)).unwrap();
        let debug_str = format!("{:?}", store);
        assert!(debug_str.starts_with("MemoryStore{"));
        assert!(debug_str.contains(":1"));
        assert!(debug_str.ends_with("}"));
    }
}
