//! Error types for materials_manager

use thiserror::Error;

/// Unified error type for registry operations
#[derive(Debug, Error)]
pub enum Error {
    /// A field failed validation; no mutation was performed
    #[error("Validation error: {0}")]
    Validation(String),
    /// The operation targeted a record that does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// A unique constraint was violated on insert
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    /// An operation required a default user but none is set
    #[error("No default user is set")]
    NoDefaultUser,
    /// An operation required a default job but none is set
    #[error("No default job is set")]
    NoDefaultJob,
    /// Fewer than two records share the material name
    #[error("Nothing to compare: '{0}' is the only record with that material name")]
    NothingToCompare(String),
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// File I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to (de)serialize a snapshot document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Spreadsheet could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The sync endpoint answered with a non-success status
    #[error("Remote sync failed with status {status}: {body}")]
    RemoteSync { status: u16, body: String },
}

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;
