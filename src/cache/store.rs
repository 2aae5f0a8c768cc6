//! Cache Store Module
//!
//! Persistent cache engine: one SQLite file per store, TTL expiration on read
//! and prune, and LRU eviction against a soft byte capacity.

use std::fs;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::entry::{now_secs, EntryInfo, EntryType, Lookup};
use crate::cache::eviction::{enforce_capacity, live_size_bytes, EvictionOutcome, EvictionPolicy};
use crate::cache::schema::{create_schema, drop_schema, open_connection};
use crate::cache::stats::CacheStats;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

const UPSERT_SQL: &str = "INSERT INTO entries(key, value, size_bytes, created_at, last_accessed_at, expires_at, type)
     VALUES(?1, ?2, ?3, ?4, ?4, ?5, ?6)
     ON CONFLICT(key) DO UPDATE SET
         value = excluded.value,
         size_bytes = excluded.size_bytes,
         created_at = CASE
             WHEN entries.expires_at IS NOT NULL AND entries.expires_at <= excluded.created_at
             THEN excluded.created_at
             ELSE entries.created_at
         END,
         last_accessed_at = excluded.last_accessed_at,
         expires_at = excluded.expires_at";

const DELETE_SQL: &str = "DELETE FROM entries WHERE key = ?1";

const TOUCH_ACCESS_SQL: &str = "UPDATE entries SET last_accessed_at = ?1 WHERE key = ?2";

// == Prune Report ==
/// Result of a prune pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Expired rows deleted
    pub removed_count: u64,
    /// Bytes held by the expired rows
    pub removed_bytes: u64,
    /// Rows removed by the capacity pass that followed, if it ran
    pub evicted: EvictionOutcome,
}

struct Inner {
    /// None once the store has been closed
    conn: Option<Connection>,
    stats: CacheStats,
}

// == Text Cache Store ==
/// Persistent key/value store with TTL expiry and capacity-bounded LRU eviction.
///
/// Every operation runs while holding a single mutex over the connection, so
/// multi-statement sequences (read, purge if expired, touch) are atomic with
/// respect to other callers. Share it across threads as `Arc<TextCacheStore>`.
pub struct TextCacheStore {
    config: CacheConfig,
    inner: Mutex<Inner>,
}

impl TextCacheStore {
    // == Constructor ==
    /// Opens (or creates) the store described by `config`.
    ///
    /// Creates the directory if needed, opens `<directory>/<name>.sqlite`,
    /// applies pragmas and ensures the table and indexes exist.
    pub fn open(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.directory)?;

        let path = config.database_path();
        let conn = open_connection(&path)?;
        create_schema(&conn)?;

        info!(
            path = %path.display(),
            capacity_bytes = config.capacity_bytes,
            eviction = %config.eviction_policy,
            "cache store opened"
        );

        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                conn: Some(conn),
                stats: CacheStats::new(),
            }),
        })
    }

    /// Configuration the store was opened with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// `ttl` overrides the configured default TTL; with neither set the entry
    /// never expires. Updating a live key keeps its `created_at` and its type
    /// tag; a row that had already expired but was not yet purged starts over
    /// with a fresh `created_at`. When eviction is enabled the write may evict
    /// other keys to get back under capacity; the write and the eviction
    /// commit together.
    pub fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl: Option<Duration>,
        entry_type: EntryType,
    ) -> Result<()> {
        validate_key(key)?;
        self.with_conn(|conn, stats| {
            let now = now_secs();
            let expires_at = self.resolve_expiry(ttl, now);
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.prepare_cached(UPSERT_SQL)?.execute(params![
                key,
                value,
                value.len() as i64,
                now,
                expires_at,
                entry_type.as_str()
            ])?;

            let outcome = if self.enforces_capacity() {
                enforce_capacity(&tx, self.config.capacity_bytes, now)?
            } else {
                EvictionOutcome::default()
            };
            tx.commit()?;

            stats.record_evictions(outcome.evicted_count);
            debug!(key, size = value.len(), entry_type = %entry_type, "entry stored");
            Ok(())
        })
    }

    // == Lookup ==
    /// Reads `key`, distinguishing a hit, a missing key and an expired entry.
    ///
    /// Expired rows are deleted before returning. A hit refreshes
    /// `last_accessed_at`.
    pub fn lookup(&self, key: &str) -> Result<Lookup> {
        validate_key(key)?;
        self.with_conn(|conn, stats| {
            let now = now_secs();
            let row: Option<(Vec<u8>, Option<f64>)> = conn
                .prepare_cached("SELECT value, expires_at FROM entries WHERE key = ?1")?
                .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;

            let Some((value, expires_at)) = row else {
                stats.record_miss();
                return Ok(Lookup::Miss);
            };

            if matches!(expires_at, Some(expires) if expires <= now) {
                conn.prepare_cached(DELETE_SQL)?.execute(params![key])?;
                stats.record_miss();
                stats.record_expired(1);
                debug!(key, "expired entry purged on read");
                return Ok(Lookup::Expired);
            }

            conn.prepare_cached(TOUCH_ACCESS_SQL)?
                .execute(params![now, key])?;
            stats.record_hit();
            Ok(Lookup::Hit(value))
        })
    }

    // == Get ==
    /// Reads `key`, returning an empty payload when it is absent or expired.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.lookup(key).map(Lookup::into_bytes)
    }

    // == Get By Type ==
    /// Returns up to `limit` live payloads tagged `entry_type`, in storage order.
    ///
    /// Expired rows of that type are purged first; returned rows have their
    /// `last_accessed_at` refreshed.
    pub fn get_by_type(&self, entry_type: EntryType, limit: usize) -> Result<Vec<Vec<u8>>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(|conn, stats| fetch_by_type(conn, stats, entry_type, limit))
    }

    /// Returns every live payload tagged `entry_type`.
    pub fn get_all_by_type(&self, entry_type: EntryType) -> Result<Vec<Vec<u8>>> {
        // LIMIT -1 means no limit in SQLite
        self.with_conn(|conn, stats| fetch_by_type(conn, stats, entry_type, -1))
    }

    // == Remove ==
    /// Deletes `key`. Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.with_conn(|conn, _| {
            conn.prepare_cached(DELETE_SQL)?.execute(params![key])?;
            Ok(())
        })
    }

    // == Contains ==
    /// Whether a live entry exists for `key`.
    ///
    /// Never fails: a closed store or a storage error reads as `false`.
    pub fn contains(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        self.with_conn(|conn, _| {
            let found = conn
                .prepare_cached(
                    "SELECT 1 FROM entries
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)
                     LIMIT 1",
                )?
                .exists(params![key, now_secs()])?;
            Ok(found)
        })
        .unwrap_or(false)
    }

    // == Touch ==
    /// Resets the expiry of a live entry to `now + ttl`, or clears it when
    /// `ttl` is None, and refreshes `last_accessed_at`.
    ///
    /// Returns false when no live entry exists; expired rows are not revived.
    pub fn touch(&self, key: &str, ttl: Option<Duration>) -> Result<bool> {
        validate_key(key)?;
        self.with_conn(|conn, _| {
            let now = now_secs();
            let expires_at = ttl.map(|ttl| now + ttl.as_secs_f64());
            let updated = conn
                .prepare_cached(
                    "UPDATE entries SET expires_at = ?1, last_accessed_at = ?2
                     WHERE key = ?3 AND (expires_at IS NULL OR expires_at > ?2)",
                )?
                .execute(params![expires_at, now, key])?;
            Ok(updated > 0)
        })
    }

    // == Prune ==
    /// Deletes every expired row and, when `obey_capacity` is set and the
    /// policy is LRU, enforces capacity afterwards.
    pub fn prune(&self, obey_capacity: bool) -> Result<PruneReport> {
        self.with_conn(|conn, stats| {
            let now = now_secs();
            let tx = conn.transaction()?;
            let (count, bytes): (i64, i64) = tx.query_row(
                "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM entries
                 WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            tx.execute(
                "DELETE FROM entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )?;

            let mut report = PruneReport {
                removed_count: count.max(0) as u64,
                removed_bytes: bytes.max(0) as u64,
                evicted: EvictionOutcome::default(),
            };
            if obey_capacity && self.enforces_capacity() {
                report.evicted = enforce_capacity(&tx, self.config.capacity_bytes, now)?;
            }
            tx.commit()?;

            stats.record_expired(report.removed_count);
            stats.record_evictions(report.evicted.evicted_count);

            info!(
                removed = report.removed_count,
                removed_bytes = report.removed_bytes,
                evicted = report.evicted.evicted_count,
                "prune finished"
            );
            Ok(report)
        })
    }

    // == Remove All ==
    /// Deletes every row. Returns the number of rows deleted.
    pub fn remove_all(&self) -> Result<usize> {
        self.with_conn(|conn, _| {
            let removed = conn.execute("DELETE FROM entries", [])?;
            info!(removed, "all entries removed");
            Ok(removed)
        })
    }

    // == Reset Table ==
    /// Drops and recreates the table and its indexes.
    pub fn reset_table(&self) -> Result<()> {
        self.with_conn(|conn, _| {
            let tx = conn.transaction()?;
            drop_schema(&tx)?;
            create_schema(&tx)?;
            tx.commit()?;
            warn!(name = self.name(), "cache table reset");
            Ok(())
        })
    }

    // == Introspection ==
    /// Metadata for the row stored under `key`, if any.
    ///
    /// Reports the row as stored, including rows that have expired but have
    /// not been purged yet; use `EntryInfo::is_expired_at` to tell them apart.
    pub fn entry_info(&self, key: &str) -> Result<Option<EntryInfo>> {
        validate_key(key)?;
        self.with_conn(|conn, _| {
            let info = conn
                .prepare_cached(
                    "SELECT key, size_bytes, created_at, last_accessed_at, expires_at
                     FROM entries WHERE key = ?1",
                )?
                .query_row(params![key], |row| {
                    let size: i64 = row.get(1)?;
                    Ok(EntryInfo {
                        key: row.get(0)?,
                        size_bytes: size.max(0) as u64,
                        created_at: row.get(2)?,
                        last_accessed_at: row.get(3)?,
                        expires_at: row.get(4)?,
                    })
                })
                .optional()?;
            Ok(info)
        })
    }

    /// All live keys in ascending order.
    pub fn all_keys(&self) -> Result<Vec<String>> {
        self.with_conn(|conn, _| {
            let mut stmt = conn.prepare_cached(
                "SELECT key FROM entries
                 WHERE expires_at IS NULL OR expires_at > ?1
                 ORDER BY key ASC",
            )?;
            let keys = stmt
                .query_map(params![now_secs()], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(keys)
        })
    }

    /// Sum of payload sizes over live entries.
    pub fn current_size_bytes(&self) -> Result<u64> {
        self.with_conn(|conn, _| Ok(live_size_bytes(conn, now_secs())?))
    }

    // == Stats ==
    /// Returns counters since open plus the current live totals.
    pub fn stats(&self) -> Result<CacheStats> {
        self.with_conn(|conn, stats| {
            let (entries, bytes): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM entries
                 WHERE expires_at IS NULL OR expires_at > ?1",
                params![now_secs()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let mut snapshot = stats.clone();
            snapshot.total_entries = entries.max(0) as u64;
            snapshot.total_bytes = bytes.max(0) as u64;
            Ok(snapshot)
        })
    }

    // == Close ==
    /// Closes the backing database. Calling it again is a no-op.
    ///
    /// The store is marked closed even when closing the connection reports an
    /// error.
    pub fn close(&self) -> Result<()> {
        let Some(conn) = self.lock().conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                info!(name = self.name(), "cache store closed");
                Ok(())
            }
            Err((_conn, err)) => Err(err.into()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().conn.is_none()
    }

    // == Internals ==
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Row state lives in SQLite transactions, so a panic mid-operation
        // cannot leave the guarded data half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_conn<T>(
        &self,
        op: impl FnOnce(&mut Connection, &mut CacheStats) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock();
        let Inner { conn, stats } = &mut *guard;
        let conn = conn.as_mut().ok_or(CacheError::Closed)?;
        op(conn, stats)
    }

    fn enforces_capacity(&self) -> bool {
        self.config.eviction_policy == EvictionPolicy::Lru && self.config.capacity_bytes > 0
    }

    fn resolve_expiry(&self, ttl: Option<Duration>, now: f64) -> Option<f64> {
        ttl.or(self.config.default_ttl)
            .map(|ttl| now + ttl.as_secs_f64())
    }
}

impl Drop for TextCacheStore {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(name = self.name(), error = %err, "failed to close cache store");
        }
    }
}

impl std::fmt::Debug for TextCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCacheStore")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey);
    }
    Ok(())
}

fn fetch_by_type(
    conn: &mut Connection,
    stats: &mut CacheStats,
    entry_type: EntryType,
    limit: i64,
) -> Result<Vec<Vec<u8>>> {
    let now = now_secs();
    let tx = conn.transaction()?;

    let purged = tx.execute(
        "DELETE FROM entries
         WHERE type = ?1 AND expires_at IS NOT NULL AND expires_at <= ?2",
        params![entry_type.as_str(), now],
    )?;
    if purged > 0 {
        stats.record_expired(purged as u64);
        debug!(purged, entry_type = %entry_type, "expired entries purged on typed read");
    }

    let rows: Vec<(String, Vec<u8>)> = {
        let mut stmt = tx.prepare_cached(
            "SELECT key, value FROM entries
             WHERE type = ?1 AND (expires_at IS NULL OR expires_at > ?2)
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![entry_type.as_str(), now, limit], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;
        rows.collect::<std::result::Result<Vec<(String, Vec<u8>)>, _>>()?
    };

    {
        let mut touch = tx.prepare_cached(TOUCH_ACCESS_SQL)?;
        for (key, _) in &rows {
            touch.execute(params![now, key])?;
        }
    }
    tx.commit()?;

    Ok(rows.into_iter().map(|(_, value)| value).collect())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir, capacity_bytes: u64) -> TextCacheStore {
        let config = CacheConfig::new("test_cache", dir.path()).with_capacity_bytes(capacity_bytes);
        TextCacheStore::open(config).unwrap()
    }

    #[test]
    fn test_store_open_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = TextCacheStore::open(CacheConfig::new("nested", &nested)).unwrap();

        assert!(nested.join("nested.sqlite").exists());
        assert!(!store.is_closed());
        assert_eq!(store.current_size_bytes().unwrap(), 0);
    }

    #[test]
    fn test_store_open_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = TextCacheStore::open(CacheConfig::new("", dir.path()));
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_store_open_fails_when_directory_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, b"not a directory").unwrap();

        let result = TextCacheStore::open(CacheConfig::new("c", &file));
        assert!(matches!(result, Err(CacheError::Io { .. })));
    }

    #[test]
    fn test_store_set_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store.set("key1", b"value1", None, EntryType::AccountDetails).unwrap();
        assert_eq!(store.get("key1").unwrap(), b"value1".to_vec());
        assert_eq!(store.lookup("key1").unwrap(), Lookup::Hit(b"value1".to_vec()));
    }

    #[test]
    fn test_store_get_nonexistent_is_empty_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        assert_eq!(store.lookup("nonexistent").unwrap(), Lookup::Miss);
        assert!(store.get("nonexistent").unwrap().is_empty());
    }

    #[test]
    fn test_store_empty_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        assert!(matches!(
            store.set("", b"v", None, EntryType::AccountDetails),
            Err(CacheError::InvalidKey)
        ));
        assert!(matches!(store.get(""), Err(CacheError::InvalidKey)));
        assert!(matches!(store.remove(""), Err(CacheError::InvalidKey)));
        assert!(matches!(store.touch("", None), Err(CacheError::InvalidKey)));
        assert!(matches!(store.entry_info(""), Err(CacheError::InvalidKey)));
        assert!(!store.contains(""));
    }

    #[test]
    fn test_store_empty_payload_is_a_hit() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store.set("empty", b"", None, EntryType::AccountDetails).unwrap();
        assert_eq!(store.lookup("empty").unwrap(), Lookup::Hit(Vec::new()));
        assert!(store.contains("empty"));
    }

    #[test]
    fn test_store_overwrite_preserves_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store.set("key1", b"first", None, EntryType::AccountDetails).unwrap();
        let before = store.entry_info("key1").unwrap().unwrap();

        sleep(Duration::from_millis(20));
        store.set("key1", b"second!", None, EntryType::AccountDetails).unwrap();
        let after = store.entry_info("key1").unwrap().unwrap();

        assert_eq!(after.created_at, before.created_at);
        assert!(after.last_accessed_at > before.last_accessed_at);
        assert_eq!(after.size_bytes, 7);
        assert_eq!(store.get("key1").unwrap(), b"second!".to_vec());
    }

    #[test]
    fn test_store_set_over_expired_row_resets_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store
            .set("key1", b"old", Some(Duration::from_millis(50)), EntryType::AccountDetails)
            .unwrap();
        let before = store.entry_info("key1").unwrap().unwrap();

        sleep(Duration::from_millis(200));
        // The expired row is still on disk; the write must not inherit its age
        assert!(store.entry_info("key1").unwrap().is_some());
        store.set("key1", b"new", None, EntryType::AccountDetails).unwrap();
        let after = store.entry_info("key1").unwrap().unwrap();

        assert!(after.created_at > before.created_at);
        assert_eq!(after.created_at, after.last_accessed_at);
        assert!(after.expires_at.is_none());
    }

    #[test]
    fn test_store_overwrite_keeps_type_tag() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store.set("key1", b"v1", None, EntryType::TransactionDetails).unwrap();
        store.set("key1", b"v2", None, EntryType::TransactionHistory).unwrap();

        assert_eq!(
            store.get_all_by_type(EntryType::TransactionDetails).unwrap(),
            vec![b"v2".to_vec()]
        );
        assert!(store
            .get_all_by_type(EntryType::TransactionHistory)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_store_set_evicts_within_same_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 100);

        store.set("a", &[0u8; 60], None, EntryType::AccountDetails).unwrap();
        sleep(Duration::from_millis(5));
        store.set("b", &[0u8; 60], None, EntryType::AccountDetails).unwrap();

        // A fresh connection only sees committed state: the new row is there
        // and the evicted one is already gone
        let conn = Connection::open(store.config().database_path()).unwrap();
        let keys: Vec<String> = conn
            .prepare("SELECT key FROM entries ORDER BY key")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(keys, vec!["b"]);
        assert_eq!(store.name(), "test_cache");
    }

    #[test]
    fn test_store_ttl_expiration() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store
            .set("key1", b"value1", Some(Duration::from_millis(200)), EntryType::TransactionDetails)
            .unwrap();
        assert_eq!(store.get("key1").unwrap(), b"value1".to_vec());

        sleep(Duration::from_millis(300));

        assert_eq!(store.lookup("key1").unwrap(), Lookup::Expired);
        assert!(store.entry_info("key1").unwrap().is_none());
        assert_eq!(store.lookup("key1").unwrap(), Lookup::Miss);
    }

    #[test]
    fn test_store_default_ttl_applies() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig::new("ttl", dir.path())
            .with_default_ttl(Some(Duration::from_millis(200)));
        let store = TextCacheStore::open(config).unwrap();

        store.set("defaulted", b"v", None, EntryType::AccountDetails).unwrap();
        store
            .set("explicit", b"v", Some(Duration::from_secs(60)), EntryType::AccountDetails)
            .unwrap();
        assert!(store.entry_info("defaulted").unwrap().unwrap().expires_at.is_some());

        sleep(Duration::from_millis(300));

        assert!(!store.contains("defaulted"));
        assert!(store.contains("explicit"));
    }

    #[test]
    fn test_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store.set("key1", b"value1", None, EntryType::AccountDetails).unwrap();
        store.remove("key1").unwrap();
        store.remove("key1").unwrap();
        store.remove("never_set").unwrap();

        assert!(!store.contains("key1"));
        assert!(!store.contains("never_set"));
    }

    #[test]
    fn test_store_touch_extends_and_clears_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store
            .set("key1", b"v", Some(Duration::from_millis(200)), EntryType::AccountDetails)
            .unwrap();
        assert!(store.touch("key1", None).unwrap());
        assert!(store.entry_info("key1").unwrap().unwrap().expires_at.is_none());

        sleep(Duration::from_millis(300));
        assert!(store.contains("key1"));

        assert!(store.touch("key1", Some(Duration::from_secs(60))).unwrap());
        assert!(store.entry_info("key1").unwrap().unwrap().expires_at.is_some());
        assert!(!store.touch("missing", None).unwrap());
    }

    #[test]
    fn test_store_touch_does_not_revive_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 1024);

        store
            .set("key1", b"v", Some(Duration::from_millis(100)), EntryType::AccountDetails)
            .unwrap();
        sleep(Duration::from_millis(200));

        assert!(!store.touch("key1", None).unwrap());
        assert!(store.get("key1").unwrap().is_empty());
    }

    #[test]
    fn test_store_capacity_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 100);

        store.set("a", &[1u8; 60], None, EntryType::AccountDetails).unwrap();
        sleep(Duration::from_millis(5));
        store.set("b", &[2u8; 60], None, EntryType::AccountDetails).unwrap();

        assert_eq!(store.current_size_bytes().unwrap(), 60);
        assert!(!store.contains("a"));
        assert!(store.contains("b"));
        assert_eq!(store.stats().unwrap().evictions, 1);
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 90);

        store.set("key1", &[0u8; 30], None, EntryType::AccountDetails).unwrap();
        sleep(Duration::from_millis(5));
        store.set("key2", &[0u8; 30], None, EntryType::AccountDetails).unwrap();
        sleep(Duration::from_millis(5));
        store.set("key3", &[0u8; 30], None, EntryType::AccountDetails).unwrap();
        sleep(Duration::from_millis(5));

        // Access key1 to make it most recently used
        store.get("key1").unwrap();
        sleep(Duration::from_millis(5));

        // Adding key4 should evict key2 (now oldest)
        store.set("key4", &[0u8; 30], None, EntryType::AccountDetails).unwrap();

        assert!(store.contains("key1"));
        assert!(!store.contains("key2"));
        assert!(store.contains("key3"));
        assert!(store.contains("key4"));
    }

    #[test]
    fn test_store_eviction_policy_none_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig::new("unbounded", dir.path())
            .with_capacity_bytes(10)
            .with_eviction_policy(EvictionPolicy::None);
        let store = TextCacheStore::open(config).unwrap();

        store.set("a", &[0u8; 8], None, EntryType::AccountDetails).unwrap();
        store.set("b", &[0u8; 8], None, EntryType::AccountDetails).unwrap();

        assert_eq!(store.current_size_bytes().unwrap(), 16);
        let report = store.prune(true).unwrap();
        assert_eq!(report.evicted, EvictionOutcome::default());
        assert_eq!(store.all_keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_store_get_by_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 4096);

        store.set("h1", b"history-1", None, EntryType::TransactionHistory).unwrap();
        store.set("h2", b"history-2", None, EntryType::TransactionHistory).unwrap();
        store.set("acc", b"account", None, EntryType::AccountDetails).unwrap();

        let mut history = store.get_by_type(EntryType::TransactionHistory, 10).unwrap();
        history.sort();
        assert_eq!(history, vec![b"history-1".to_vec(), b"history-2".to_vec()]);

        let accounts = store.get_by_type(EntryType::AccountDetails, 10).unwrap();
        assert_eq!(accounts, vec![b"account".to_vec()]);

        assert_eq!(store.get_by_type(EntryType::TransactionHistory, 1).unwrap().len(), 1);
        assert!(store.get_by_type(EntryType::TransactionHistory, 0).unwrap().is_empty());
        assert!(store.get_by_type(EntryType::TransactionDetails, 10).unwrap().is_empty());
    }

    #[test]
    fn test_store_get_by_type_purges_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 4096);

        store
            .set("short", b"s", Some(Duration::from_millis(100)), EntryType::TransactionHistory)
            .unwrap();
        store.set("long", b"l", None, EntryType::TransactionHistory).unwrap();
        sleep(Duration::from_millis(200));

        let values = store.get_all_by_type(EntryType::TransactionHistory).unwrap();
        assert_eq!(values, vec![b"l".to_vec()]);
        assert!(store.entry_info("short").unwrap().is_none());
        assert_eq!(store.stats().unwrap().expired, 1);
    }

    #[test]
    fn test_store_prune() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 4096);

        store
            .set("key1", &[0u8; 10], Some(Duration::from_millis(100)), EntryType::AccountDetails)
            .unwrap();
        store
            .set("key2", &[0u8; 20], Some(Duration::from_millis(100)), EntryType::AccountDetails)
            .unwrap();
        store.set("key3", &[0u8; 5], None, EntryType::AccountDetails).unwrap();

        sleep(Duration::from_millis(200));

        let report = store.prune(true).unwrap();
        assert_eq!(report.removed_count, 2);
        assert_eq!(report.removed_bytes, 30);
        assert_eq!(store.all_keys().unwrap(), vec!["key3"]);

        let report = store.prune(false).unwrap();
        assert_eq!(report, PruneReport::default());
    }

    #[test]
    fn test_store_remove_all_and_reset_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 4096);

        store.set("a", b"1", None, EntryType::AccountDetails).unwrap();
        store.set("b", b"2", None, EntryType::AccountDetails).unwrap();
        assert_eq!(store.remove_all().unwrap(), 2);
        assert!(store.all_keys().unwrap().is_empty());

        store.set("c", b"3", None, EntryType::AccountDetails).unwrap();
        store.reset_table().unwrap();
        assert!(store.all_keys().unwrap().is_empty());

        // Table is usable again after reset
        store.set("d", b"4", None, EntryType::AccountDetails).unwrap();
        assert_eq!(store.get("d").unwrap(), b"4".to_vec());
    }

    #[test]
    fn test_store_all_keys_sorted_and_live_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 4096);

        store.set("zeta", b"z", None, EntryType::AccountDetails).unwrap();
        store.set("alpha", b"a", None, EntryType::AccountDetails).unwrap();
        store
            .set("gone", b"g", Some(Duration::from_millis(100)), EntryType::AccountDetails)
            .unwrap();
        sleep(Duration::from_millis(200));

        assert_eq!(store.all_keys().unwrap(), vec!["alpha", "zeta"]);
        assert_eq!(store.current_size_bytes().unwrap(), 2);
    }

    #[test]
    fn test_store_stats() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 4096);

        store.set("key1", b"value1", None, EntryType::AccountDetails).unwrap();
        store.get("key1").unwrap(); // hit
        store.get("nonexistent").unwrap(); // miss

        let stats = store.stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_bytes, 6);
    }

    #[test]
    fn test_store_close_semantics() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir, 4096);
        store.set("key1", b"v", None, EntryType::AccountDetails).unwrap();

        store.close().unwrap();
        assert!(store.is_closed());
        store.close().unwrap();

        assert!(matches!(store.get("key1"), Err(CacheError::Closed)));
        assert!(matches!(
            store.set("key1", b"v", None, EntryType::AccountDetails),
            Err(CacheError::Closed)
        ));
        assert!(matches!(store.remove("key1"), Err(CacheError::Closed)));
        assert!(matches!(store.prune(true), Err(CacheError::Closed)));
        assert!(matches!(store.all_keys(), Err(CacheError::Closed)));
        assert!(!store.contains("key1"));
        // Key validation happens before the closed check
        assert!(matches!(store.get(""), Err(CacheError::InvalidKey)));
    }
}
