//! Text Cache - A persistent key/value cache for upstream API responses
//!
//! Stores opaque payloads in a local SQLite file with TTL expiration and
//! LRU eviction against a soft byte capacity.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    CacheStats, EntryInfo, EntryType, EvictionOutcome, EvictionPolicy, Lookup, PruneReport,
    TextCacheStore,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::spawn_prune_task;
