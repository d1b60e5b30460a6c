//! Equality-only scan filters.
//!
//! A filter is a conjunction of `attribute == value` clauses. There are no
//! ranges, no ordering, and no partial matches.

use crate::item::{values_equal, Item, ID_ATTR, TYPE_ATTR};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Conjunction of attribute equalities. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, Value>);

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching the row with the given id.
    #[must_use]
    pub fn by_id(id: impl AsRef<str>) -> Self {
        Self::new().where_eq(ID_ATTR, id.as_ref())
    }

    /// Adds (or replaces) an equality clause.
    #[must_use]
    pub fn where_eq(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Scopes the filter to one discriminator, overriding any `type` clause.
    #[must_use]
    pub fn with_type(self, discriminator: &str) -> Self {
        self.where_eq(TYPE_ATTR, discriminator)
    }

    /// Returns true if every clause is satisfied by `item`. Numbers match by
    /// value, so a clause on `41` matches a stored `41.0`.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        self.0.iter().all(|(name, expected)| {
            item.get(name)
                .is_some_and(|stored| values_equal(stored, expected))
        })
    }

    /// Returns the required value for `name`, if constrained.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Item> for Filter {
    fn from(item: Item) -> Self {
        Self(item.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
