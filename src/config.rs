//! Configuration Module
//!
//! Describes where a cache store lives and how it bounds itself. Configuration
//! is built explicitly or loaded from environment variables, and is validated
//! before a store is opened.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{EvictionPolicy, DATABASE_EXTENSION, DEFAULT_CAPACITY_BYTES};
use crate::error::{CacheError, Result};

/// Default logical store name used by `from_env`.
pub const DEFAULT_STORE_NAME: &str = "text_cache";

/// Default interval between background prune runs.
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Cache store configuration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Logical store name; the database file is `<name>.sqlite`
    pub name: String,
    /// Directory holding the database file, created if absent
    pub directory: PathBuf,
    /// Soft byte budget for live entries (0 disables capacity enforcement)
    pub capacity_bytes: u64,
    /// Expiry applied to writes that carry no TTL of their own
    pub default_ttl: Option<Duration>,
    /// What to do when the store grows past `capacity_bytes`
    pub eviction_policy: EvictionPolicy,
    /// Interval between background prune runs
    pub prune_interval: Duration,
}

impl CacheConfig {
    /// Creates a configuration with default capacity, no default TTL and LRU eviction.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            default_ttl: None,
            eviction_policy: EvictionPolicy::Lru,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        }
    }

    pub fn with_capacity_bytes(mut self, capacity_bytes: u64) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    pub fn with_default_ttl(mut self, default_ttl: Option<Duration>) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    pub fn with_eviction_policy(mut self, eviction_policy: EvictionPolicy) -> Self {
        self.eviction_policy = eviction_policy;
        self
    }

    pub fn with_prune_interval(mut self, prune_interval: Duration) -> Self {
        self.prune_interval = prune_interval;
        self
    }

    /// Full path of the backing database file.
    pub fn database_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}.{}", self.name, DATABASE_EXTENSION))
    }

    /// Checks the configuration for values a store cannot be opened with.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CacheError::Config("store name must not be empty".to_string()));
        }
        if self.name.contains(['/', '\\']) {
            return Err(CacheError::Config(format!(
                "store name must not contain path separators: {}",
                self.name
            )));
        }
        if self.default_ttl == Some(Duration::ZERO) {
            return Err(CacheError::Config(
                "default TTL must be greater than zero".to_string(),
            ));
        }
        if self.prune_interval.is_zero() {
            return Err(CacheError::Config(
                "prune interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `TEXT_CACHE_DIR` - Directory for the database file (required)
    /// - `TEXT_CACHE_NAME` - Logical store name (default: text_cache)
    /// - `TEXT_CACHE_CAPACITY_BYTES` - Soft capacity in bytes (default: 50 MiB)
    /// - `TEXT_CACHE_DEFAULT_TTL` - Default TTL in seconds (default: none)
    /// - `TEXT_CACHE_EVICTION` - `lru` or `none` (default: lru)
    /// - `TEXT_CACHE_PRUNE_INTERVAL` - Prune interval in seconds (default: 60)
    pub fn from_env() -> Result<Self> {
        let directory = env::var("TEXT_CACHE_DIR").map_err(|_| {
            CacheError::Config("TEXT_CACHE_DIR environment variable not set".to_string())
        })?;
        let name = env::var("TEXT_CACHE_NAME").unwrap_or_else(|_| DEFAULT_STORE_NAME.to_string());

        let mut config = Self::new(name, directory);
        if let Some(capacity) = parse_var::<u64>("TEXT_CACHE_CAPACITY_BYTES")? {
            config.capacity_bytes = capacity;
        }
        if let Some(ttl) = parse_var::<f64>("TEXT_CACHE_DEFAULT_TTL")? {
            config.default_ttl = Some(seconds("TEXT_CACHE_DEFAULT_TTL", ttl)?);
        }
        if let Some(policy) = parse_var::<EvictionPolicy>("TEXT_CACHE_EVICTION")? {
            config.eviction_policy = policy;
        }
        if let Some(interval) = parse_var::<f64>("TEXT_CACHE_PRUNE_INTERVAL")? {
            config.prune_interval = seconds("TEXT_CACHE_PRUNE_INTERVAL", interval)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Directory as a path reference.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CacheError::Config(format!("{name} has an invalid value: {raw}"))),
        Err(_) => Ok(None),
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| CacheError::Config(format!("{name} must be a non-negative number of seconds")))
}
