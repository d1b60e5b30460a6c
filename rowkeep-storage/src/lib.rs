//! Single-table storage for rowkeep.
//!
//! Every entity kind shares one wide table partitioned by `id`; rows are told
//! apart only by their `type` discriminator. This crate defines the backend
//! contract and ships two implementations:
//!
//! - [`MemoryTable`] — in-process, with operation counters and optional latency
//! - [`DuckTable`] — DuckDB, rows stored as JSON documents
//!
//! # Architecture
//!
//! - `scan` is the only read path: equality filters, no ranges, no pagination
//! - `update` merges attributes into the stored row instead of replacing it
//! - `update` and `delete` accept a [`Condition`] checked atomically with the write
//! - No multi-row transactions; callers build consistency on conditional writes

mod backend;
mod config;
mod duck;
mod error;
mod memory;

pub use backend::{Condition, TableBackend};
pub use config::{validate_table_name, TableConfig, DB_PATH_ENV, TABLE_ENV};
pub use duck::DuckTable;
pub use error::{StorageError, StorageResult};
pub use memory::{MemoryTable, TableStats};

use std::sync::Arc;
use tracing::warn;

/// Opens the table described by `config` as a shared backend handle.
///
/// A configured `path` selects an on-disk DuckDB database; otherwise the table
/// lives in an in-memory DuckDB database.
pub fn open_table(config: &TableConfig) -> StorageResult<Arc<dyn TableBackend>> {
    Ok(Arc::new(DuckTable::open(config)?))
}

/// Open a DuckDB connection with stale WAL recovery.
///
/// If the initial open fails and a `.wal` file exists alongside the database,
/// it is removed and the open is retried once. This handles the common case
/// where an unclean shutdown leaves a WAL file that prevents reopening.
pub fn open_duckdb_with_wal_recovery(path: &std::path::Path) -> StorageResult<duckdb::Connection> {
    match duckdb::Connection::open(path) {
        Ok(conn) => Ok(conn),
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                warn!(
                    "DuckDB open failed, removing stale WAL and retrying: {}",
                    wal_path.display()
                );
                if std::fs::remove_file(&wal_path).is_ok() {
                    return duckdb::Connection::open(path).map_err(Into::into);
                }
            }
            Err(first_err.into())
        }
    }
}
