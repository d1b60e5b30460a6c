//! Typed records over a single shared table.
//!
//! A [`Record`] maps one in-memory entity onto one row of a table every kind
//! shares, told apart by a `type` discriminator. The crate provides:
//!
//! - validated writes: the kind's schema checks the attribute bag before any
//!   insert or update reaches the table
//! - per-instance write serialization: a second `save` on an instance whose
//!   previous `save` has not settled fails immediately with
//!   [`RecordError::Locked`]
//! - optimistic versioning: updates are conditional on the stored `_version`,
//!   so writers holding different instances of the same row cannot silently
//!   overwrite each other
//! - polymorphic rehydration: [`Record::find`] turns rows back into records of
//!   the kind their discriminator names, via the closed [`EntityKind`] set
//! - reference population: attributes listed as references are resolved to
//!   the records they point at, in memory only
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use rowkeep_model::{EntitySchema, FieldSpec, Schema};
//! # use rowkeep_record::{EntityKind, Record, RecordResult};
//! # use rowkeep_storage::{MemoryTable, TableBackend};
//! # use rowkeep_types::Filter;
//! # #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! # enum Kind { User }
//! # impl EntityKind for Kind {
//! #     fn discriminator(&self) -> &'static str { "User" }
//! #     fn from_discriminator(tag: &str) -> Option<Self> {
//! #         match tag { "User" => Some(Kind::User), _ => None }
//! #     }
//! #     fn schema(&self) -> Arc<dyn Schema> {
//! #         Arc::new(EntitySchema::new(vec![FieldSpec::text("name").required()]))
//! #     }
//! #     fn refs(&self) -> &'static [&'static str] { &["managerId"] }
//! # }
//! # async fn run() -> RecordResult<()> {
//! let table: Arc<dyn TableBackend> = Arc::new(MemoryTable::new("records"));
//!
//! let raw = serde_json::json!({"name": "Ann", "managerId": "mgr-1"});
//! let ann = Record::new(Arc::clone(&table), Kind::User, raw.as_object().cloned().unwrap_or_default()).await?;
//! ann.save().await?;
//!
//! let filter = Filter::new().where_eq("name", "Ann");
//! let mut found = Record::find_kind(&table, Kind::User, Some(&filter)).await?;
//! Record::populate_all(&table, &mut found).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod guard;
mod kind;
mod record;

pub use error::{RecordError, RecordResult};
pub use kind::EntityKind;
pub use record::Record;
