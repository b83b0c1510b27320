//! Storage error handling
//!
//! Provides typed errors for storage operations. Data-not-found on reads
//! is never an error (fetches return `Option`/empty collections); the
//! `NotFound` variant covers writes that target a missing row.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::gateway::EntityKind;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// A write (update, duplicate) targeted a uid with no matching row
    #[error("no {kind} with uid '{uid}'")]
    NotFound { kind: EntityKind, uid: Uuid },

    /// The backing store cannot be reached (writer thread gone, open failed)
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// Failed to create the data directory
    #[error("failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file could not be parsed
    #[error("invalid config file '{path}': {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// SQLite database error (constraint violations surface here)
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted row could not be mapped back to a model
    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// True if this error reports a missing row rather than a store fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
