//! Shared kinds, tables and builders for record tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rowkeep_model::{EntitySchema, FieldSpec, PermissiveSchema, Schema};
use rowkeep_record::{EntityKind, Record};
use rowkeep_storage::{Condition, MemoryTable, StorageError, StorageResult, TableBackend};
use rowkeep_types::{Filter, Item};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The entity kinds used across record tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    User,
    Manager,
    Team,
    /// Free-form kind whose schema accepts any bag unchanged.
    Note,
}

impl EntityKind for Kind {
    fn discriminator(&self) -> &'static str {
        match self {
            Kind::User => "User",
            Kind::Manager => "Manager",
            Kind::Team => "Team",
            Kind::Note => "Note",
        }
    }

    fn from_discriminator(tag: &str) -> Option<Self> {
        match tag {
            "User" => Some(Kind::User),
            "Manager" => Some(Kind::Manager),
            "Team" => Some(Kind::Team),
            "Note" => Some(Kind::Note),
            _ => None,
        }
    }

    fn schema(&self) -> Arc<dyn Schema> {
        match self {
            Kind::User => Arc::new(EntitySchema::new(vec![
                FieldSpec::text("name").required(),
                FieldSpec::number("age"),
                FieldSpec::relation("managerId"),
                FieldSpec::relation("teamId"),
            ])),
            Kind::Manager => Arc::new(EntitySchema::new(vec![
                FieldSpec::text("name").required(),
                FieldSpec::number("level").with_default(1),
            ])),
            Kind::Team => Arc::new(
                EntitySchema::new(vec![
                    FieldSpec::text("title").required(),
                    FieldSpec::relation("leadId"),
                ])
                .strict(),
            ),
            Kind::Note => Arc::new(PermissiveSchema),
        }
    }

    fn refs(&self) -> &'static [&'static str] {
        match self {
            Kind::User => &["managerId", "teamId"],
            Kind::Manager => &[],
            Kind::Team => &["leadId"],
            Kind::Note => &[],
        }
    }
}

/// Routes record-layer debug logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rowkeep=debug")
        .with_test_writer()
        .try_init();
}

pub fn make_item(value: Value) -> Item {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// A memory table plus the same table behind the backend trait object.
pub fn memory_table() -> (Arc<MemoryTable>, Arc<dyn TableBackend>) {
    let memory = Arc::new(MemoryTable::new("records"));
    let table: Arc<dyn TableBackend> = memory.clone();
    (memory, table)
}

/// A memory table whose every call suspends for `latency`.
pub fn slow_table(latency: Duration) -> (Arc<MemoryTable>, Arc<dyn TableBackend>) {
    let memory = Arc::new(MemoryTable::new("records").with_latency(latency));
    let table: Arc<dyn TableBackend> = memory.clone();
    (memory, table)
}

pub async fn make_record(table: &Arc<dyn TableBackend>, kind: Kind, raw: Value) -> Record<Kind> {
    Record::new(Arc::clone(table), kind, make_item(raw)).await.unwrap()
}

pub async fn make_saved(table: &Arc<dyn TableBackend>, kind: Kind, raw: Value) -> Record<Kind> {
    let record = make_record(table, kind, raw).await;
    record.save().await.unwrap();
    record
}

/// Writes a row straight into the table, bypassing the record layer.
pub async fn put_raw(table: &Arc<dyn TableBackend>, raw: Value) {
    table.put(make_item(raw)).await.unwrap();
}

/// Memory table that rejects the first `failures` puts.
pub struct FlakyTable {
    inner: MemoryTable,
    failures: AtomicUsize,
}

impl FlakyTable {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: MemoryTable::new("records"),
            failures: AtomicUsize::new(failures),
        }
    }

    pub fn inner(&self) -> &MemoryTable {
        &self.inner
    }
}

#[async_trait]
impl TableBackend for FlakyTable {
    fn table_name(&self) -> &str {
        self.inner.table_name()
    }

    async fn scan(&self, filter: Option<&Filter>) -> StorageResult<Vec<Item>> {
        self.inner.scan(filter).await
    }

    async fn put(&self, item: Item) -> StorageResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::InvalidData("simulated put failure".to_string()));
        }
        self.inner.put(item).await
    }

    async fn update(
        &self,
        id: &str,
        attrs: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<Item> {
        self.inner.update(id, attrs, condition).await
    }

    async fn delete(&self, id: &str, condition: Option<&Condition>) -> StorageResult<()> {
        self.inner.delete(id, condition).await
    }
}
