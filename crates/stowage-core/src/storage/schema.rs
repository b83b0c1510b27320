//! SQLite schema for the inventory store
//!
//! Two tables, one per entity kind. There is deliberately no foreign key
//! constraint and no `ON DELETE CASCADE` on `goods.box_uid`: cascade
//! policy belongs to the storage manager, which applies it as an explicit
//! transaction. The store itself only guarantees row identity.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Schema version tracking
        CREATE TABLE IF NOT EXISTS schema_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Boxes table
        CREATE TABLE IF NOT EXISTS boxes (
            uid TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        -- Goods table (box_uid is a soft reference, nullable)
        CREATE TABLE IF NOT EXISTS goods (
            uid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            box_uid TEXT
        );

        -- Lookup goods by owning box (cascade delete, with-goods reads)
        CREATE INDEX IF NOT EXISTS idx_goods_box_uid ON goods(box_uid);
        "#,
    )?;

    // Set schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<Option<i32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_info WHERE key = 'version'")?;
    let result: Result<String> = stmt.query_row([], |row| row.get(0));

    match result {
        Ok(version_str) => Ok(version_str.parse().ok()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if schema needs initialization or migration
pub fn needs_init(conn: &Connection) -> bool {
    let table_exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_info'")
        .and_then(|mut stmt| stmt.exists([]))
        .unwrap_or(false);

    if !table_exists {
        return true;
    }

    match get_schema_version(conn) {
        Ok(Some(v)) => v < SCHEMA_VERSION,
        _ => true,
    }
}
