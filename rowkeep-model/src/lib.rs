//! Schema contract for rowkeep records.
//!
//! Defines the capability every record depends on to normalize and check its
//! attribute bag:
//! - [`Schema`] — the two-operation contract (`parse`, `validate`)
//! - [`ValidationError`] — rejection reported by `validate` (never a storage error)
//! - [`EntitySchema`] — a declarative implementation built from [`FieldSpec`]s
//! - [`PermissiveSchema`] — accepts any bag unchanged
//!
//! The record layer only ever talks to `dyn Schema`, so alternative validation
//! engines can be plugged in without touching it.

mod adapter;
mod error;
mod schema;

pub use adapter::{PermissiveSchema, Schema};
pub use error::{FieldError, ValidationError};
pub use schema::{EntitySchema, FieldSpec, FieldType};
