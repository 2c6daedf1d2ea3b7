//! Sharded counters backed by a durable store and a cache.
//!
//! A counter receiving many concurrent increments would serialize on a single
//! record. [`ShardedCounter`] spreads the increments of each named counter
//! over several shard records and sums them back on read.
//!
//! # Architecture
//!
//! ```text
//!                               ┌────────────────────────────────────┐
//!                               │            Datastore               │
//!                               ├────────────────────────────────────┤
//!   increment("visits") ──┐     │ Config  visits       shards=20     │
//!     random pick in      ├──►  │ Shard   visits-shard3   count=41   │
//!     [0, shard_count)    └──►  │ Shard   visits-shard17  count=38   │
//!                               │   ...   (absent shards count 0)    │
//!                               └────────────────────────────────────┘
//!                                                 │
//!                                                 ▼
//!   count("visits") ──► Cache "GeneralCounterShard:visits" ── miss ──►
//!                       query all shards, sum, cache for 60s
//! ```
//!
//! # Consistency
//!
//! Each shard update is a single-key transaction, so no increment is ever
//! lost. Different shards are updated independently and reads are not
//! coordinated with writes: [`count`](ShardedCounter::count) may lag behind by
//! the increments in flight, and by anything that happened while a total was
//! cached. Once the cached total expires the next read is exact.
//!
//! The cache is advisory. Its failures are discarded at the call site and
//! never fail an operation.
//!
//! # Partial Progress
//!
//! [`increment`](ShardedCounter::increment) runs two independent
//! transactions: one to create the counter configuration if needed, one to
//! bump a shard. If the second fails, the first stays committed.

mod config;

pub use config::{
    ShardedCounterConfig, DEFAULT_CACHE_TTL, DEFAULT_CONFIG_KIND, DEFAULT_SHARDS,
    DEFAULT_SHARD_KIND,
};

use std::fmt::{self, Debug};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, trace};

use crate::cache::{Cache, CacheError, MemoryCache};
use crate::error::{CounterError, Result};
use crate::store::{ConfigRecord, Datastore, Key, MemoryStore, Record, ShardRecord, StoreError};

/// An existing shard of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShardInfo {
    /// Shard index, below the shard count in force when it was created.
    pub index: usize,
    /// Increments committed to this shard.
    pub count: u64,
}

/// Named counters whose totals are split over shard records in a [`Datastore`].
///
/// The component holds no counter state in memory and, unless a shared
/// generator was injected with [`with_rng`](Self::with_rng), takes no locks of
/// its own: it can be shared between threads (typically behind an `Arc`) and
/// relies on the store's single-key transactions for correctness.
///
/// # Examples
///
/// ```rust
/// use contatori_store::cache::MemoryCache;
/// use contatori_store::counters::ShardedCounter;
/// use contatori_store::store::MemoryStore;
///
/// let counter = ShardedCounter::new(MemoryStore::new(), MemoryCache::new());
///
/// counter.increment("visits")?;
/// counter.increment("visits")?;
/// assert_eq!(counter.count("visits")?, 2);
///
/// // Unknown counters are simply zero.
/// assert_eq!(counter.count("never-seen")?, 0);
/// # Ok::<(), contatori_store::error::CounterError>(())
/// ```
///
/// Multi-threaded usage:
///
/// ```rust
/// use contatori_store::cache::NoCache;
/// use contatori_store::counters::ShardedCounter;
/// use contatori_store::store::MemoryStore;
/// use std::sync::Arc;
/// use std::thread;
///
/// let counter = Arc::new(ShardedCounter::new(MemoryStore::new(), NoCache));
/// let mut handles = vec![];
///
/// for _ in 0..4 {
///     let c = Arc::clone(&counter);
///     handles.push(thread::spawn(move || {
///         for _ in 0..100 {
///             c.increment("requests").unwrap();
///         }
///     }));
/// }
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(counter.count("requests").unwrap(), 400);
/// ```
pub struct ShardedCounter<S = MemoryStore, C = MemoryCache> {
    store: S,
    cache: C,
    config: ShardedCounterConfig,
    picker: ShardPicker,
}

/// Source of randomness for shard selection.
enum ShardPicker {
    /// `rand::rng()`, one generator per thread.
    ThreadLocal,
    /// An injected generator, shared by every caller.
    Shared(Mutex<Box<dyn RngCore + Send>>),
}

impl<S: Datastore, C: Cache> ShardedCounter<S, C> {
    /// Creates a counter family with the default configuration.
    pub fn new(store: S, cache: C) -> Self {
        Self::with_config(store, cache, ShardedCounterConfig::default())
    }

    /// Creates a counter family with the given configuration.
    ///
    /// Shards are picked with the thread-local generator returned by
    /// [`rand::rng`], so concurrent increments never wait on each other.
    pub fn with_config(store: S, cache: C, config: ShardedCounterConfig) -> Self {
        Self {
            store,
            cache,
            config,
            picker: ShardPicker::ThreadLocal,
        }
    }

    /// Replaces the source of randomness used to pick shards.
    ///
    /// The generator is shared by all threads and held under a mutex for the
    /// duration of each draw. Meant for tests and reproducible runs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contatori_store::cache::NoCache;
    /// use contatori_store::counters::ShardedCounter;
    /// use contatori_store::store::MemoryStore;
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    ///
    /// let counter = ShardedCounter::new(MemoryStore::new(), NoCache)
    ///     .with_rng(StdRng::seed_from_u64(7));
    /// counter.increment("jobs")?;
    /// # Ok::<(), contatori_store::error::CounterError>(())
    /// ```
    pub fn with_rng(self, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            picker: ShardPicker::Shared(Mutex::new(Box::new(rng))),
            ..self
        }
    }

    /// Picks shards with a [`StdRng`] seeded from `seed`, for reproducible runs.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ShardedCounterConfig {
        &self.config
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the underlying cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Returns the total of counter `name`.
    ///
    /// A cached total is returned as is, without touching the store. Otherwise
    /// every shard of the counter is read and summed, and the sum is cached
    /// for [`cache_ttl`](ShardedCounterConfig::cache_ttl). A counter that was
    /// never incremented counts zero.
    ///
    /// # Errors
    ///
    /// Fails if the store query fails; no partial sum is returned.
    pub fn count(&self, name: &str) -> Result<u64> {
        check_name(name)?;
        let cache_key = self.config.cache_key(name);

        match self.cache.get(&cache_key) {
            Ok(Some(total)) => {
                trace!(counter = name, total, "cache hit");
                return Ok(total);
            }
            Ok(None) => trace!(counter = name, "cache miss"),
            Err(err) => debug!(counter = name, %err, "cache lookup failed, treated as a miss"),
        }

        let total: u64 = self
            .store
            .query(&self.config.shard_kind, name)?
            .into_iter()
            .map(|(_, record)| match record {
                Record::Shard(shard) => shard.count,
                Record::Config(_) => 0,
            })
            .sum();

        fire_and_forget(
            "set",
            &cache_key,
            self.cache.set(&cache_key, total, self.config.cache_ttl),
        );
        Ok(total)
    }

    /// Adds one to counter `name`.
    ///
    /// The counter configuration is created with the default shard count if
    /// it does not exist yet. A shard is then picked uniformly at random
    /// below the shard count and incremented in its own transaction. Finally
    /// a cached total, if present, is bumped by one.
    ///
    /// # Errors
    ///
    /// Fails if either transaction fails. The configuration may have been
    /// created even when the shard update failed.
    pub fn increment(&self, name: &str) -> Result<()> {
        check_name(name)?;
        let shard_count = self.ensure_config(name)?.shard_count;
        let index = self.pick_shard(shard_count);
        trace!(counter = name, index, shard_count, "picked shard");

        let key = self.config.shard_key(name, index);
        let mut created = false;
        self.store.update(&key, &mut |current| {
            created = current.is_none();
            let mut shard = match current {
                None => ShardRecord {
                    name: name.to_string(),
                    count: 0,
                },
                Some(Record::Shard(shard)) => shard,
                Some(Record::Config(_)) => return Err(unexpected(&key, "shard")),
            };
            shard.count += 1;
            Ok(Record::Shard(shard))
        })?;
        if created {
            debug!(counter = name, index, "created shard");
        }

        let cache_key = self.config.cache_key(name);
        fire_and_forget("increment", &cache_key, self.cache.increment(&cache_key, 1));
        Ok(())
    }

    /// Raises the shard count of counter `name` to at least `shards`.
    ///
    /// The configuration is created first if needed. The shard count never
    /// decreases: asking for fewer shards than configured is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if `shards` is zero or the store transaction fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use contatori_store::cache::NoCache;
    /// use contatori_store::counters::ShardedCounter;
    /// use contatori_store::store::MemoryStore;
    ///
    /// let counter = ShardedCounter::new(MemoryStore::new(), NoCache);
    ///
    /// counter.increase_shards("visits", 50)?;
    /// assert_eq!(counter.shard_count("visits")?, 50);
    ///
    /// counter.increase_shards("visits", 10)?;
    /// assert_eq!(counter.shard_count("visits")?, 50);
    /// # Ok::<(), contatori_store::error::CounterError>(())
    /// ```
    pub fn increase_shards(&self, name: &str, shards: usize) -> Result<()> {
        check_name(name)?;
        if shards == 0 {
            return Err(CounterError::InvalidShardCount(shards));
        }

        let key = self.config.config_key(name);
        let initial = self.config.initial_shards();
        let mut previous = None;
        self.store.update(&key, &mut |current| {
            let mut config = match current {
                None => ConfigRecord {
                    shard_count: initial,
                },
                Some(Record::Config(config)) => config,
                Some(Record::Shard(_)) => return Err(unexpected(&key, "config")),
            };
            previous = Some(config.shard_count);
            config.shard_count = config.shard_count.max(shards);
            Ok(Record::Config(config))
        })?;

        if let Some(previous) = previous.filter(|&previous| previous < shards) {
            debug!(counter = name, previous, shards, "increased shard count");
        }
        Ok(())
    }

    /// Returns the configured shard count of counter `name`.
    ///
    /// Counters without a configuration report the default shard count; no
    /// configuration is created.
    pub fn shard_count(&self, name: &str) -> Result<usize> {
        check_name(name)?;
        let key = self.config.config_key(name);
        match self.store.get(&key)? {
            None => Ok(self.config.initial_shards()),
            Some(Record::Config(config)) => Ok(config.shard_count),
            Some(Record::Shard(_)) => Err(unexpected(&key, "config").into()),
        }
    }

    /// Returns the existing shards of counter `name`, sorted by index.
    ///
    /// Shard indices that were never picked have no record and are not listed.
    /// Shard records of the counter whose key is not `"<name>-shard<index>"`
    /// are skipped, though [`count`](Self::count) still adds them to the total.
    pub fn shards(&self, name: &str) -> Result<Vec<ShardInfo>> {
        check_name(name)?;
        let mut shards: Vec<ShardInfo> = self
            .store
            .query(&self.config.shard_kind, name)?
            .into_iter()
            .filter_map(|(key, record)| match record {
                Record::Shard(shard) => match self.config.shard_index(name, &key) {
                    Some(index) => Some(ShardInfo {
                        index,
                        count: shard.count,
                    }),
                    None => {
                        debug!(counter = name, %key, count = shard.count, "skipped unindexed shard");
                        None
                    }
                },
                Record::Config(_) => None,
            })
            .collect();
        shards.sort_unstable();
        Ok(shards)
    }

    /// Reads the configuration of `name`, creating it if absent.
    fn ensure_config(&self, name: &str) -> Result<ConfigRecord> {
        let key = self.config.config_key(name);

        // Shard counts only grow, so an untransacted read is never unsafe.
        match self.store.get(&key)? {
            Some(Record::Config(config)) => return Ok(config),
            Some(Record::Shard(_)) => return Err(unexpected(&key, "config").into()),
            None => {}
        }

        let initial = self.config.initial_shards();
        let mut created = false;
        let committed = self.store.update(&key, &mut |current| {
            created = current.is_none();
            match current {
                None => Ok(Record::Config(ConfigRecord {
                    shard_count: initial,
                })),
                Some(Record::Config(config)) => Ok(Record::Config(config)),
                Some(Record::Shard(_)) => Err(unexpected(&key, "config")),
            }
        })?;

        match committed {
            Record::Config(config) => {
                if created {
                    debug!(counter = name, shards = config.shard_count, "created counter config");
                }
                Ok(config)
            }
            Record::Shard(_) => Err(unexpected(&key, "config").into()),
        }
    }

    fn pick_shard(&self, shard_count: usize) -> usize {
        let range = 0..shard_count.max(1);
        match &self.picker {
            ShardPicker::ThreadLocal => rand::rng().random_range(range),
            ShardPicker::Shared(rng) => rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .random_range(range),
        }
    }
}

impl<S, C> Debug for ShardedCounter<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCounter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        Err(CounterError::EmptyName)
    } else {
        Ok(())
    }
}

fn unexpected(key: &Key, expected: &'static str) -> StoreError {
    StoreError::Unexpected {
        key: key.clone(),
        expected,
    }
}

/// Issues a best-effort cache operation: the outcome is dropped by contract.
fn fire_and_forget<T: Debug>(op: &str, key: &str, outcome: std::result::Result<T, CacheError>) {
    match outcome {
        Ok(value) => trace!(op, key, ?value, "cache updated"),
        Err(err) => debug!(op, key, %err, "cache update discarded"),
    }
}
