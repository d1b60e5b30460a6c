//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from DuckDB.
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row not found.
    #[error("row not found: {0}")]
    NotFound(String),

    /// A conditional write found the row in an unexpected state.
    #[error("condition failed for {id}: {condition}")]
    ConditionFailed { id: String, condition: String },

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Table name unusable as an SQL identifier.
    #[error("invalid table name: {0}")]
    InvalidTableName(String),

    /// Background blocking task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),

    /// A previous holder of the connection lock panicked.
    #[error("connection lock poisoned")]
    Poisoned,
}

impl StorageError {
    /// Returns true for a failed conditional write.
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, Self::ConditionFailed { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
