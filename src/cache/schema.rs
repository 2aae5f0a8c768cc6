//! Database schema and connection setup.

use std::path::Path;

use rusqlite::Connection;

/// Open (or create) the database file and apply connection pragmas.
pub(crate) fn open_connection(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// WAL journal, relaxed sync and in-memory temp storage. A cache can afford
/// to lose the last few commits on power loss.
fn configure_connection(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         PRAGMA temp_store=MEMORY;
         PRAGMA mmap_size=134217728;",
    )
}

pub(crate) fn create_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS entries (
             key TEXT PRIMARY KEY,
             value BLOB NOT NULL,
             size_bytes INTEGER NOT NULL,
             created_at REAL NOT NULL,
             last_accessed_at REAL NOT NULL,
             expires_at REAL NULL,
             type TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_entries_expires_at ON entries(expires_at);
         CREATE INDEX IF NOT EXISTS idx_entries_last_accessed ON entries(last_accessed_at);
         CREATE INDEX IF NOT EXISTS idx_entries_type ON entries(type);",
    )
}

/// Drops the table; its indexes go with it.
pub(crate) fn drop_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("DROP TABLE IF EXISTS entries;")
}
