//! In-process table backend.
//!
//! Rows live in a `BTreeMap` keyed by id, so scans come back in id order just
//! like [`DuckTable`](crate::DuckTable). Every operation is counted in
//! [`TableStats`], and an optional artificial latency turns each call into a
//! real suspension point, which makes interleavings reproducible in tests.

use crate::backend::{item_id, merge_update, require_row, Condition, TableBackend};
use crate::error::StorageResult;
use async_trait::async_trait;
use rowkeep_types::{Filter, Item};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Snapshot of how many times each operation reached the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub scans: usize,
    /// Scans issued without a filter.
    pub full_scans: usize,
    pub puts: usize,
    pub updates: usize,
    pub deletes: usize,
}

#[derive(Debug, Default)]
struct Counters {
    scans: AtomicUsize,
    full_scans: AtomicUsize,
    puts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

/// Table backend held entirely in memory.
#[derive(Debug)]
pub struct MemoryTable {
    name: String,
    rows: RwLock<BTreeMap<String, Item>>,
    counters: Counters,
    latency: Option<Duration>,
}

impl MemoryTable {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::new(BTreeMap::new()),
            counters: Counters::default(),
            latency: None,
        }
    }

    /// Makes every operation sleep for `latency` before touching the rows.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Returns the operation counters.
    pub fn stats(&self) -> TableStats {
        TableStats {
            scans: self.counters.scans.load(Ordering::Relaxed),
            full_scans: self.counters.full_scans.load(Ordering::Relaxed),
            puts: self.counters.puts.load(Ordering::Relaxed),
            updates: self.counters.updates.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
        }
    }

    /// Zeroes the operation counters.
    pub fn reset_stats(&self) {
        for counter in [
            &self.counters.scans,
            &self.counters.full_scans,
            &self.counters.puts,
            &self.counters.updates,
            &self.counters.deletes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Number of rows currently stored.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Reads a row directly, bypassing the counters.
    pub async fn get(&self, id: &str) -> Option<Item> {
        self.rows.read().await.get(id).cloned()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::new("records")
    }
}

#[async_trait]
impl TableBackend for MemoryTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    async fn scan(&self, filter: Option<&Filter>) -> StorageResult<Vec<Item>> {
        self.counters.scans.fetch_add(1, Ordering::Relaxed);
        if filter.is_none() {
            self.counters.full_scans.fetch_add(1, Ordering::Relaxed);
        }
        self.delay().await;
        let rows = self.rows.read().await;
        let items: Vec<Item> = rows
            .values()
            .filter(|row| filter.is_none_or(|f| f.matches(row)))
            .cloned()
            .collect();
        debug!("scan {} -> {} rows", self.name, items.len());
        Ok(items)
    }

    async fn put(&self, item: Item) -> StorageResult<()> {
        self.counters.puts.fetch_add(1, Ordering::Relaxed);
        let id = item_id(&item)?;
        self.delay().await;
        self.rows.write().await.insert(id, item);
        Ok(())
    }

    async fn update(
        &self,
        id: &str,
        attrs: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<Item> {
        self.counters.updates.fetch_add(1, Ordering::Relaxed);
        self.delay().await;
        let mut rows = self.rows.write().await;
        require_row(id, rows.get(id), condition)?;
        let row = rows
            .get_mut(id)
            .ok_or_else(|| crate::StorageError::NotFound(id.to_string()))?;
        merge_update(row, attrs);
        Ok(row.clone())
    }

    async fn delete(&self, id: &str, condition: Option<&Condition>) -> StorageResult<()> {
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.delay().await;
        let mut rows = self.rows.write().await;
        require_row(id, rows.get(id), condition)?;
        rows.remove(id);
        Ok(())
    }
}
