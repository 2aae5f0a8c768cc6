//! Eviction Module
//!
//! Capacity enforcement for the store: when live bytes exceed the configured
//! budget, rows are deleted in least-recently-accessed order.

use std::fmt;
use std::str::FromStr;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::EVICTION_BATCH_SIZE;

// == Eviction Policy ==
/// What the store does when it grows past its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Never evict; capacity is informational only
    None,
    /// Evict least-recently-accessed entries first
    #[default]
    Lru,
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::None => f.write_str("none"),
            EvictionPolicy::Lru => f.write_str("lru"),
        }
    }
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(EvictionPolicy::None),
            "lru" => Ok(EvictionPolicy::Lru),
            other => Err(format!("unknown eviction policy: {other}")),
        }
    }
}

// == Eviction Outcome ==
/// Rows and bytes removed by one capacity enforcement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvictionOutcome {
    pub evicted_count: u64,
    pub evicted_bytes: u64,
}

/// Sum of `size_bytes` over rows that are live at `now`.
pub(crate) fn live_size_bytes(conn: &Connection, now: f64) -> Result<u64, rusqlite::Error> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(size_bytes), 0) FROM entries
         WHERE expires_at IS NULL OR expires_at > ?1",
        params![now],
        |row| row.get(0),
    )?;
    Ok(total.max(0) as u64)
}

// == Enforce Capacity ==
/// Deletes least-recently-accessed live rows until live bytes fit in `capacity`.
///
/// Candidates are fetched in batches of `EVICTION_BATCH_SIZE`, oldest access
/// first (ties broken by insertion order), stopping as soon as the running
/// total fits. The loop gives up when no candidates remain, so the cap is
/// best-effort. Runs on whatever transaction `conn` is in; callers open one
/// so the eviction commits or rolls back together with the write that
/// triggered it.
pub(crate) fn enforce_capacity(
    conn: &Connection,
    capacity: u64,
    now: f64,
) -> Result<EvictionOutcome, rusqlite::Error> {
    let mut outcome = EvictionOutcome::default();
    let mut total = live_size_bytes(conn, now)?;
    if total <= capacity {
        return Ok(outcome);
    }

    let mut select = conn.prepare_cached(
        "SELECT key, size_bytes FROM entries
         WHERE expires_at IS NULL OR expires_at > ?1
         ORDER BY last_accessed_at ASC, rowid ASC
         LIMIT ?2",
    )?;
    let mut delete = conn.prepare_cached("DELETE FROM entries WHERE key = ?1")?;

    while total > capacity {
        let candidates = select
            .query_map(params![now, EVICTION_BATCH_SIZE as i64], |row| {
                let size: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, size.max(0) as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        if candidates.is_empty() {
            break;
        }

        for (key, size) in candidates {
            delete.execute(params![key])?;
            total = total.saturating_sub(size);
            outcome.evicted_count += 1;
            outcome.evicted_bytes += size;
            if total <= capacity {
                break;
            }
        }
    }

    debug!(
        evicted = outcome.evicted_count,
        bytes = outcome.evicted_bytes,
        remaining = total,
        capacity,
        "capacity enforcement finished"
    );
    Ok(outcome)
}
