//! SQLite seen store implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{SeenStore, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed seen store
pub struct SqliteSeenStore {
    conn: Connection,
}

impl SqliteSeenStore {
    /// Opens or creates the database at `path`
    ///
    /// The parent directory is created when missing.
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Total number of identities recorded
    pub fn count_total(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen_items", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl SeenStore for SqliteSeenStore {
    fn is_new(&self, identity: &str) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM seen_items WHERE identity = ?1",
            params![identity],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }

    fn mark_seen(&mut self, entries: &[(&str, &str)]) -> StorageResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let first_seen = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO seen_items (identity, source_id, first_seen) VALUES (?1, ?2, ?3)",
            )?;
            for (source_id, identity) in entries {
                stmt.execute(params![identity, source_id, first_seen])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn count_for_source(&self, source_id: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM seen_items WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
