//! Table configuration.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the shared table.
pub const TABLE_ENV: &str = "ROWKEEP_TABLE";
/// Environment variable pointing at the DuckDB file.
pub const DB_PATH_ENV: &str = "ROWKEEP_DB_PATH";

/// Where the shared table lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Name of the single table every entity kind is written to.
    pub table_name: String,
    /// DuckDB database file. `None` keeps the table in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_name: "records".to_string(),
            path: None,
        }
    }
}

impl TableConfig {
    /// Reads `ROWKEEP_TABLE` and `ROWKEEP_DB_PATH`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            table_name: lookup(TABLE_ENV)
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.table_name),
            path: lookup(DB_PATH_ENV).filter(|v| !v.is_empty()).map(PathBuf::from),
        }
    }

    /// Rejects table names that cannot be used as a plain SQL identifier.
    pub fn validate(&self) -> StorageResult<()> {
        validate_table_name(&self.table_name)
    }
}

/// Table names must match `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_table_name(name: &str) -> StorageResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidTableName(name.to_string()))
    }
}
