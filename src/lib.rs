//! # Contatori Store - Sharded Counters in a Transactional Store
//!
//! A Rust library providing named counters that survive the process, built
//! for workloads where many concurrent requests bump the same counter. The
//! library implements the **sharded counter pattern** on top of any store
//! offering single-key transactions, with a short-lived cache in front of it.
//!
//! ## The Problem
//!
//! Persisting a counter as a single record serializes every increment on that
//! record: each writer must read, add one and commit while every other
//! writer waits or retries. Under heavy traffic the record becomes a hot spot
//! and throughput collapses to one transaction at a time.
//!
//! ## The Solution: Sharded Counters
//!
//! Each counter is split over several **shard** records (20 by default).
//! An increment picks one shard at random and updates only that record, so
//! concurrent increments rarely meet on the same key. A read sums all the
//! shards, and the sum is cached for a minute so most reads are free.
//!
//! ### Design Principles
//!
//! 1. **Random Sharding**: shard indices are drawn uniformly from
//!    `[0, shard_count)`, spreading contention by a factor of `shard_count`.
//!
//! 2. **Lazy Records**: configurations and shards are created on first
//!    write. A shard that was never picked has no record and counts zero.
//!
//! 3. **Growing Shard Count**: a hot counter can be given more shards with
//!    [`increase_shards`](counters::ShardedCounter::increase_shards); the
//!    shard count never shrinks.
//!
//! 4. **Advisory Cache**: totals are cached and bumped best-effort. Cache
//!    failures never fail an operation; reads may lag by at most the cache
//!    lifetime.
//!
//! ## Quick Start
//!
//! ```rust
//! use contatori_store::cache::MemoryCache;
//! use contatori_store::counters::ShardedCounter;
//! use contatori_store::store::MemoryStore;
//!
//! // Create a counter family (can be shared across threads via Arc)
//! let counters = ShardedCounter::new(MemoryStore::new(), MemoryCache::new());
//!
//! // Increment from any thread
//! counters.increment("visits")?;
//! counters.increment("visits")?;
//!
//! // Read the total (cached for 60 seconds)
//! assert_eq!(counters.count("visits")?, 2);
//!
//! // Give a hot counter more room
//! counters.increase_shards("visits", 50)?;
//! # Ok::<(), contatori_store::error::CounterError>(())
//! ```
//!
//! ## Bringing Your Own Store
//!
//! The [`Datastore`](store::Datastore) and [`Cache`](cache::Cache) traits are
//! the only seams. [`MemoryStore`](store::MemoryStore) and
//! [`MemoryCache`](cache::MemoryCache) are in-process implementations; a
//! document database and a memcached-like service plug in the same way.
//!
//! ## Observers
//!
//! Counter totals can be captured in a `snapshot` and exported. Each
//! observer is gated behind a feature flag:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | `serde` | `snapshot` | Serializable snapshots of counter totals |
//! | `table` | `observers::table` | Pretty-print counters as ASCII tables |
//! | `json` | `observers::json` | Serialize counters to JSON |
//! | `full` | All observers | Enables all observer modules |
//!
//! ## Logging
//!
//! The library emits [`tracing`] events (`debug` for created records and
//! discarded cache updates, `trace` for cache hits and shard picks) and never
//! installs a subscriber.

pub mod cache;
pub mod counters;
pub mod error;
pub mod observers;
pub mod store;

#[cfg(feature = "serde")]
pub mod snapshot;
