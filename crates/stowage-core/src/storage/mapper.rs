//! Entity mapper
//!
//! Pure conversion between the gateway's row representations and the
//! `StorageBox`/`Good` model types. No I/O, no shared state.

use uuid::Uuid;

use crate::models::{Good, StorageBox};
use crate::storage::error::{StorageError, StorageResult};

/// Row representation of a box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxRow {
    pub uid: String,
    pub name: String,
}

/// Row representation of a good
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoodRow {
    pub uid: String,
    pub title: String,
    pub box_uid: Option<String>,
}

/// Convert a box to its row representation
pub fn box_to_row(b: &StorageBox) -> BoxRow {
    BoxRow {
        uid: b.uid.to_string(),
        name: b.name.clone(),
    }
}

/// Convert a row back to a box (items left empty)
pub fn row_to_box(row: BoxRow) -> StorageResult<StorageBox> {
    let uid = parse_uid("box", &row.uid)?;
    Ok(StorageBox::with_uid(uid, row.name))
}

/// Convert a good to its row representation
pub fn good_to_row(g: &Good) -> GoodRow {
    GoodRow {
        uid: g.uid.to_string(),
        title: g.title.clone(),
        box_uid: g.box_uid.map(|uid| uid.to_string()),
    }
}

/// Convert a row back to a good
pub fn row_to_good(row: GoodRow) -> StorageResult<Good> {
    let uid = parse_uid("good", &row.uid)?;
    let box_uid = row
        .box_uid
        .as_deref()
        .map(|value| parse_uid("good.box_uid", value))
        .transpose()?;
    Ok(Good::with_uid(uid, row.title, box_uid))
}

fn parse_uid(field: &str, value: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StorageError::MalformedRow(format!("invalid {field} uid '{value}'")))
}
