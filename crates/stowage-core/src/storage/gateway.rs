//! Persistence gateway
//!
//! `Database` owns the only handle capable of mutating on-disk state and
//! exposes row-level operations: insert, point lookup by uid, lookup by
//! owning box, full scan, delete by uid, delete-all, count. Each call is
//! atomic on its own; multi-step invariants (cascade delete, duplication)
//! are composed by the storage manager inside a [`DatabaseTx`].
//!
//! The gateway knows nothing about cross-entity policy.

use std::fmt;

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::config::Config;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::mapper::{BoxRow, GoodRow};
use crate::storage::schema::{init_schema, needs_init};

/// The two entity kinds the gateway stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Box,
    Good,
}

impl EntityKind {
    fn table(self) -> &'static str {
        match self {
            EntityKind::Box => "boxes",
            EntityKind::Good => "goods",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Box => "box",
            EntityKind::Good => "good",
        })
    }
}

/// Row-level access to the SQLite inventory store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database at the configured path
    pub fn open(config: &Config) -> StorageResult<Self> {
        let path = config.sqlite_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Begin a transaction scoping a multi-step write
    ///
    /// Dropping the returned value without calling `commit` rolls back.
    pub fn transaction(&mut self) -> StorageResult<DatabaseTx<'_>> {
        Ok(DatabaseTx {
            tx: self.conn.transaction()?,
        })
    }

    pub fn insert_box(&self, row: &BoxRow) -> StorageResult<()> {
        insert_box(&self.conn, row)
    }

    pub fn insert_good(&self, row: &GoodRow) -> StorageResult<()> {
        insert_good(&self.conn, row)
    }

    pub fn fetch_boxes(&self) -> StorageResult<Vec<BoxRow>> {
        fetch_boxes(&self.conn)
    }

    pub fn fetch_box(&self, uid: &str) -> StorageResult<Option<BoxRow>> {
        fetch_box(&self.conn, uid)
    }

    pub fn fetch_goods(&self) -> StorageResult<Vec<GoodRow>> {
        fetch_goods(&self.conn)
    }

    pub fn fetch_good(&self, uid: &str) -> StorageResult<Option<GoodRow>> {
        fetch_good(&self.conn, uid)
    }

    pub fn fetch_goods_by_box(&self, box_uid: &str) -> StorageResult<Vec<GoodRow>> {
        fetch_goods_by_box(&self.conn, box_uid)
    }

    /// Replace the mutable fields of a stored box; returns rows affected
    pub fn update_box(&self, row: &BoxRow) -> StorageResult<usize> {
        update_box(&self.conn, row)
    }

    /// Delete one row by uid; returns rows affected (0 on miss)
    pub fn delete_by_uid(&self, kind: EntityKind, uid: &str) -> StorageResult<usize> {
        delete_by_uid(&self.conn, kind, uid)
    }

    pub fn delete_all(&self, kind: EntityKind) -> StorageResult<usize> {
        delete_all(&self.conn, kind)
    }

    pub fn count(&self, kind: EntityKind) -> StorageResult<i64> {
        count(&self.conn, kind)
    }
}

/// A gateway transaction: the same row-level operations, applied as a unit
pub struct DatabaseTx<'a> {
    tx: Transaction<'a>,
}

impl DatabaseTx<'_> {
    /// Commit the transaction, making every queued change durable
    pub fn commit(self) -> StorageResult<()> {
        self.tx.commit().map_err(Into::into)
    }

    pub fn insert_box(&self, row: &BoxRow) -> StorageResult<()> {
        insert_box(&self.tx, row)
    }

    pub fn insert_good(&self, row: &GoodRow) -> StorageResult<()> {
        insert_good(&self.tx, row)
    }

    pub fn fetch_box(&self, uid: &str) -> StorageResult<Option<BoxRow>> {
        fetch_box(&self.tx, uid)
    }

    pub fn fetch_good(&self, uid: &str) -> StorageResult<Option<GoodRow>> {
        fetch_good(&self.tx, uid)
    }

    pub fn fetch_goods_by_box(&self, box_uid: &str) -> StorageResult<Vec<GoodRow>> {
        fetch_goods_by_box(&self.tx, box_uid)
    }

    pub fn delete_by_uid(&self, kind: EntityKind, uid: &str) -> StorageResult<usize> {
        delete_by_uid(&self.tx, kind, uid)
    }

    /// Delete every good owned by the given box; returns rows affected
    pub fn delete_goods_by_box(&self, box_uid: &str) -> StorageResult<usize> {
        delete_goods_by_box(&self.tx, box_uid)
    }

    pub fn delete_all(&self, kind: EntityKind) -> StorageResult<usize> {
        delete_all(&self.tx, kind)
    }
}

// ==================== Row operations ====================
//
// Shared between `Database` (autocommit) and `DatabaseTx` (transactional);
// `Transaction` derefs to `Connection`.

fn insert_box(conn: &Connection, row: &BoxRow) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO boxes (uid, name) VALUES (?1, ?2)",
        params![row.uid, row.name],
    )?;
    Ok(())
}

fn insert_good(conn: &Connection, row: &GoodRow) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO goods (uid, title, box_uid) VALUES (?1, ?2, ?3)",
        params![row.uid, row.title, row.box_uid],
    )?;
    Ok(())
}

fn fetch_boxes(conn: &Connection) -> StorageResult<Vec<BoxRow>> {
    let mut stmt = conn.prepare("SELECT uid, name FROM boxes")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BoxRow {
                uid: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn fetch_box(conn: &Connection, uid: &str) -> StorageResult<Option<BoxRow>> {
    let mut stmt = conn.prepare("SELECT uid, name FROM boxes WHERE uid = ?1")?;
    let row = stmt
        .query_row(params![uid], |row| {
            Ok(BoxRow {
                uid: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn fetch_goods(conn: &Connection) -> StorageResult<Vec<GoodRow>> {
    let mut stmt = conn.prepare("SELECT uid, title, box_uid FROM goods")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(GoodRow {
                uid: row.get(0)?,
                title: row.get(1)?,
                box_uid: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn fetch_good(conn: &Connection, uid: &str) -> StorageResult<Option<GoodRow>> {
    let mut stmt = conn.prepare("SELECT uid, title, box_uid FROM goods WHERE uid = ?1")?;
    let row = stmt
        .query_row(params![uid], |row| {
            Ok(GoodRow {
                uid: row.get(0)?,
                title: row.get(1)?,
                box_uid: row.get(2)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn fetch_goods_by_box(conn: &Connection, box_uid: &str) -> StorageResult<Vec<GoodRow>> {
    let mut stmt = conn.prepare("SELECT uid, title, box_uid FROM goods WHERE box_uid = ?1")?;
    let rows = stmt
        .query_map(params![box_uid], |row| {
            Ok(GoodRow {
                uid: row.get(0)?,
                title: row.get(1)?,
                box_uid: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn update_box(conn: &Connection, row: &BoxRow) -> StorageResult<usize> {
    let changed = conn.execute(
        "UPDATE boxes SET name = ?2 WHERE uid = ?1",
        params![row.uid, row.name],
    )?;
    Ok(changed)
}

fn delete_by_uid(conn: &Connection, kind: EntityKind, uid: &str) -> StorageResult<usize> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE uid = ?1", kind.table()),
        params![uid],
    )?;
    Ok(deleted)
}

fn delete_goods_by_box(conn: &Connection, box_uid: &str) -> StorageResult<usize> {
    let deleted = conn.execute("DELETE FROM goods WHERE box_uid = ?1", params![box_uid])?;
    Ok(deleted)
}

fn delete_all(conn: &Connection, kind: EntityKind) -> StorageResult<usize> {
    let deleted = conn.execute(&format!("DELETE FROM {}", kind.table()), [])?;
    Ok(deleted)
}

fn count(conn: &Connection, kind: EntityKind) -> StorageResult<i64> {
    let n = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", kind.table()),
        [],
        |row| row.get(0),
    )?;
    Ok(n)
}
