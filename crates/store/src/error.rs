//! Store and repository errors.

use thiserror::Error;

/// Errors that can occur during store and repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Filesystem error from the local backend.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,

    /// A document with the same id already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input rejected by domain validation.
    #[error("{0}")]
    Validation(String),
}

impl RepositoryError {
    /// Wrap a domain validation error.
    pub fn validation(err: impl std::fmt::Display) -> Self {
        Self::Validation(err.to_string())
    }
}
