//! Data models for Stowage
//!
//! Defines the core data structures: StorageBox and Good. A box is a
//! container; a good is an item optionally assigned to exactly one box.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A container that may hold goods
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageBox {
    /// Unique identifier
    pub uid: Uuid,
    /// Display name
    pub name: String,
    /// Goods assigned to this box.
    ///
    /// Populated only by `StorageManager::fetch_boxes_with_goods`; cheap
    /// reads leave it empty to avoid a join per box.
    #[serde(default)]
    pub items: Vec<Good>,
}

impl StorageBox {
    /// Create a new box with a fresh uid
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Create a box with a specific uid (for loading from storage)
    pub fn with_uid(uid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Update the display name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// An item, optionally assigned to a box
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Good {
    /// Unique identifier
    pub uid: Uuid,
    /// Display title
    pub title: String,
    /// Uid of the owning box, `None` if unassigned
    pub box_uid: Option<Uuid>,
}

impl Good {
    /// Create a new unassigned good with a fresh uid
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            title: title.into(),
            box_uid: None,
        }
    }

    /// Create a new good assigned to the given box
    pub fn in_box(title: impl Into<String>, box_uid: Uuid) -> Self {
        Self {
            uid: Uuid::new_v4(),
            title: title.into(),
            box_uid: Some(box_uid),
        }
    }

    /// Create a good with a specific uid (for loading from storage)
    pub fn with_uid(uid: Uuid, title: impl Into<String>, box_uid: Option<Uuid>) -> Self {
        Self {
            uid,
            title: title.into(),
            box_uid,
        }
    }

    /// Update the display title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Assign this good to a box
    pub fn assign_to(&mut self, box_uid: Uuid) {
        self.box_uid = Some(box_uid);
    }

    /// Detach this good from its box
    pub fn unassign(&mut self) {
        self.box_uid = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_box_has_fresh_uid_and_no_items() {
        let a = StorageBox::new("Kitchen");
        let b = StorageBox::new("Kitchen");

        assert_ne!(a.uid, b.uid);
        assert_eq!(a.name, "Kitchen");
        assert!(a.items.is_empty());
    }

    #[test]
    fn test_good_assignment() {
        let bx = StorageBox::new("Garage");
        let mut good = Good::new("Drill");
        assert_eq!(good.box_uid, None);

        good.assign_to(bx.uid);
        assert_eq!(good.box_uid, Some(bx.uid));

        good.unassign();
        assert_eq!(good.box_uid, None);
    }

    #[test]
    fn test_with_uid_round_trip_equality() {
        let uid = Uuid::new_v4();
        let original = StorageBox::with_uid(uid, "Attic");
        let reloaded = StorageBox::with_uid(uid, "Attic");

        assert_eq!(original, reloaded);
    }

    #[test]
    fn test_set_name_and_title() {
        let mut bx = StorageBox::new("Old");
        bx.set_name("New");
        assert_eq!(bx.name, "New");

        let mut good = Good::new("Old");
        good.set_title("New");
        assert_eq!(good.title, "New");
    }
}
