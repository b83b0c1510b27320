//! Storage layer
//!
//! Row-level access to the SQLite store and the pure mapping between
//! rows and model types.
//!
//! ## Architecture
//!
//! - `gateway`: owns the only database connection, exposes row CRUD and
//!   a transaction scope
//! - `mapper`: pure row / model conversion
//! - `schema`: DDL and versioning
//! - `error`: typed storage errors
//!
//! Cross-entity policy (cascade delete, duplication) lives one level up,
//! in the storage manager.

pub mod error;
pub mod gateway;
pub mod mapper;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use gateway::{Database, DatabaseTx, EntityKind};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
