//! Core type definitions for rowkeep.
//!
//! This crate defines the table-agnostic types shared by every layer:
//! - Record identifiers (UUID v7 for new records, opaque strings otherwise)
//! - Millisecond timestamps stamped on every row
//! - The attribute bag / row shape ([`Item`]) and its reserved keys
//! - Equality-only [`Filter`]s used by table scans
//!
//! Nothing here knows about schemas, storage engines, or concrete entity kinds.

mod filter;
mod ids;
mod item;
mod timestamp;

pub use filter::Filter;
pub use ids::RecordId;
pub use item::{
    is_empty_reference, is_reserved, is_truthy, Item, CREATED_AT_ATTR, ID_ATTR, MODIFIED_AT_ATTR,
    RESERVED_ATTRS, TYPE_ATTR, VERSION_ATTR, values_equal,
};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid record id: {0}")]
    InvalidId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
