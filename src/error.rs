//! Error types for the cache store
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Operation attempted after the store was closed
    #[error("cache store is closed")]
    Closed,

    /// Empty key supplied
    #[error("invalid key: key must not be empty")]
    InvalidKey,

    /// Key not found in cache (read paths report misses through `Lookup` instead)
    #[error("key not found: {0}")]
    NotFound(String),

    /// Storage engine or filesystem failure
    #[error("I/O failure{}: {message}", .code.map(|c| format!(" (code {c})")).unwrap_or_default())]
    Io {
        /// SQLite extended result code or OS error code, when known
        code: Option<i32>,
        /// Underlying error message
        message: String,
    },

    /// Missing or invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

// == Conversions ==
impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(inner, _) => Some(inner.extended_code),
            _ => None,
        };
        CacheError::Io {
            code,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io {
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache store.
pub type Result<T> = std::result::Result<T, CacheError>;
