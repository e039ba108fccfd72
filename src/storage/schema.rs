//! Database schema definitions for the seen-item store

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every item identity ever judged new
CREATE TABLE IF NOT EXISTS seen_items (
    identity TEXT PRIMARY KEY,
    source_id TEXT NOT NULL,
    first_seen TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_seen_items_source ON seen_items(source_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
