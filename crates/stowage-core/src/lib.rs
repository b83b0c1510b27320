//! Stowage Core Library
//!
//! This crate provides the core functionality for Stowage, a persistent
//! inventory store for a two-level hierarchy: boxes (containers) and
//! goods (items assigned to a box).
//!
//! # Architecture
//!
//! - **SQLite**: single local backing store, behind the persistence
//!   gateway (the only component with mutation access)
//! - **Writer thread**: all operations are applied by one dedicated
//!   thread in arrival order, so cross-entity invariants (cascade
//!   delete, duplication) are never observed half-applied
//!
//! # Quick Start
//!
//! ```text
//! let manager = StorageManager::open(&config)?;
//!
//! // Add a box with a good
//! let bx = StorageBox::new("Kitchen");
//! let good = Good::in_box("Kettle", bx.uid);
//! manager.add_boxes(vec![bx]).await?;
//! manager.add_goods(vec![good]).await?;
//!
//! // Query
//! let boxes = manager.fetch_boxes_with_goods().await?;
//! ```
//!
//! # Modules
//!
//! - `manager`: asynchronous storage manager (main entry point)
//! - `models`: data structures for boxes and goods
//! - `storage`: persistence gateway, entity mapper, schema, errors
//! - `config`: application configuration

pub mod config;
pub mod manager;
pub mod models;
pub mod storage;

pub use config::Config;
pub use manager::{StorageManager, COPY_SUFFIX};
pub use models::{Good, StorageBox};
pub use storage::{Database, EntityKind, StorageError, StorageResult};
