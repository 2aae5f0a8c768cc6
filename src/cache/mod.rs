//! Cache Module
//!
//! Provides a persistent SQLite-backed cache with TTL expiration and LRU eviction.

mod entry;
mod eviction;
mod schema;
mod stats;
mod store;


// Re-export public types
pub use entry::{now_secs, EntryInfo, EntryType, Lookup};
pub use eviction::{EvictionOutcome, EvictionPolicy};
pub use stats::CacheStats;
pub use store::{PruneReport, TextCacheStore};

// == Public Constants ==
/// Default soft capacity in bytes
pub const DEFAULT_CAPACITY_BYTES: u64 = 50 * 1024 * 1024;

/// Number of LRU candidates fetched per eviction round
pub const EVICTION_BATCH_SIZE: usize = 256;

/// File extension of the backing database
pub const DATABASE_EXTENSION: &str = "sqlite";
