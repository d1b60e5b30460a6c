//! The single-table backend contract.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use rowkeep_types::{values_equal, Filter, Item, ID_ATTR};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Guard evaluated atomically with the write it protects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    /// The stored row must hold `value` under `name`.
    AttributeEquals { name: String, value: Value },
    /// The stored row must not carry `name` at all.
    AttributeAbsent { name: String },
}

impl Condition {
    pub fn equals(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::AttributeEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self::AttributeAbsent { name: name.into() }
    }

    /// Checks the condition against the current row (`None` if missing).
    ///
    /// A missing row satisfies nothing, not even `AttributeAbsent`.
    pub fn holds(&self, row: Option<&Item>) -> bool {
        let Some(row) = row else {
            return false;
        };
        match self {
            Self::AttributeEquals { name, value } => {
                row.get(name).is_some_and(|stored| values_equal(stored, value))
            }
            Self::AttributeAbsent { name } => !row.contains_key(name),
        }
    }

    /// Checks the condition and turns a miss into `ConditionFailed`.
    pub fn check(&self, id: &str, row: Option<&Item>) -> StorageResult<()> {
        if self.holds(row) {
            Ok(())
        } else {
            Err(StorageError::ConditionFailed {
                id: id.to_string(),
                condition: self.to_string(),
            })
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeEquals { name, value } => write!(f, "{name} = {value}"),
            Self::AttributeAbsent { name } => write!(f, "attribute_not_exists({name})"),
        }
    }
}

/// One logical table shared by every entity kind, partitioned by `id`.
///
/// Backends provide no transactions beyond the atomicity of a single
/// conditional write.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Returns the table identifier this backend writes to.
    fn table_name(&self) -> &str;

    /// Returns rows in ascending id order, restricted to `filter` when given.
    async fn scan(&self, filter: Option<&Filter>) -> StorageResult<Vec<Item>>;

    /// Writes a full row, replacing any row with the same id.
    async fn put(&self, item: Item) -> StorageResult<()>;

    /// Merges `attrs` into an existing row and returns the new row.
    ///
    /// Keys absent from `attrs` keep their stored values. The `id` of a row
    /// cannot be changed.
    async fn update(
        &self,
        id: &str,
        attrs: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<Item>;

    /// Removes a row.
    async fn delete(&self, id: &str, condition: Option<&Condition>) -> StorageResult<()>;
}

/// Extracts the partition key of a row about to be written.
pub(crate) fn item_id(item: &Item) -> StorageResult<String> {
    match item.get(ID_ATTR) {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(other) => Err(StorageError::InvalidData(format!(
            "row id must be a non-empty string, got {other}"
        ))),
        None => Err(StorageError::InvalidData("row has no id".to_string())),
    }
}

/// Applies an update to a stored row, leaving the partition key alone.
pub(crate) fn merge_update(row: &mut Item, attrs: Item) {
    for (name, value) in attrs {
        if name != ID_ATTR {
            row.insert(name, value);
        }
    }
}

/// Shared missing-row handling for update and delete.
pub(crate) fn require_row<'a>(
    id: &str,
    row: Option<&'a Item>,
    condition: Option<&Condition>,
) -> StorageResult<&'a Item> {
    if let Some(condition) = condition {
        condition.check(id, row)?;
    }
    row.ok_or_else(|| StorageError::NotFound(id.to_string()))
}
