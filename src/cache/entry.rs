//! Cache Entry Module
//!
//! Defines the type tag, lookup result and introspection metadata for cache entries.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Entry Type ==
/// Group tag stored alongside every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    AccountDetails,
    TransactionDetails,
    TransactionHistory,
}

impl EntryType {
    /// All known tags.
    pub const ALL: [EntryType; 3] = [
        EntryType::AccountDetails,
        EntryType::TransactionDetails,
        EntryType::TransactionHistory,
    ];

    /// Tag as persisted in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::AccountDetails => "account_details",
            EntryType::TransactionDetails => "transaction_details",
            EntryType::TransactionHistory => "transaction_history",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown entry type: {s}"))
    }
}

// == Lookup ==
/// Outcome of a single-key read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Live entry; carries the stored payload (which may be empty)
    Hit(Vec<u8>),
    /// No row for the key
    Miss,
    /// Row existed but had expired; it has been purged
    Expired,
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Flattens to the empty-payload convention: misses and expiries become an empty vec.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Lookup::Hit(value) => value,
            Lookup::Miss | Lookup::Expired => Vec::new(),
        }
    }

    /// Payload of a hit.
    pub fn into_value(self) -> Option<Vec<u8>> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Expired => None,
        }
    }
}

// == Entry Info ==
/// Metadata snapshot of a stored row. Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub size_bytes: u64,
    pub created_at: f64,
    pub last_accessed_at: f64,
    /// None = never expires
    pub expires_at: Option<f64>,
}

impl EntryInfo {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.created_at)
    }

    pub fn last_accessed(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.last_accessed_at)
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(to_datetime)
    }

    /// Whether the row counts as expired at `now` (expiry at or before now).
    pub fn is_expired_at(&self, now: f64) -> bool {
        matches!(self.expires_at, Some(expires) if expires <= now)
    }
}

fn to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds with sub-second precision.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
