//! Error types for record operations.

use rowkeep_model::ValidationError;
use rowkeep_storage::StorageError;
use thiserror::Error;

/// Result type for record operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors surfaced by record construction, save, delete, find and populate.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Another `save` on the same instance has not settled yet.
    #[error("record is locked: a save is already in progress")]
    Locked,

    /// The schema rejected the attribute bag. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend rejected the operation.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A row carries a discriminator no entity kind claims.
    #[error("unknown entity type: {0}")]
    UnknownType(String),

    /// A row or raw bag is missing a field the record layer needs.
    #[error("invalid record data: {0}")]
    InvalidData(String),

    /// The stored row moved past the version this instance last saw.
    #[error("version conflict on {id}: expected version {expected_version}")]
    Conflict { id: String, expected_version: u64 },
}

impl RecordError {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
