//! The record: one entity instance mapped onto one row of the shared table.

use crate::error::{RecordError, RecordResult};
use crate::guard::WriteGuard;
use crate::kind::{kind_of, EntityKind};
use rowkeep_model::Schema;
use rowkeep_storage::{Condition, TableBackend};
use rowkeep_types::{
    is_empty_reference, is_reserved, is_truthy, Filter, Item, RecordId, Timestamp,
    CREATED_AT_ATTR, ID_ATTR, MODIFIED_AT_ATTR, TYPE_ATTR, VERSION_ATTR,
};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// A typed entity backed by one row of a shared table.
///
/// `id`, kind and `createdAt` are fixed at construction. Attributes change
/// through [`set`](Self::set)/[`remove`](Self::remove) and reach the table on
/// [`save`](Self::save), which inserts on first success and sends partial
/// updates afterwards. Saves take `&self` so one instance can be shared
/// between tasks; overlapping saves on the same instance are refused with
/// [`RecordError::Locked`] rather than queued.
pub struct Record<K: EntityKind> {
    table: Arc<dyn TableBackend>,
    kind: K,
    schema: Arc<dyn Schema>,
    id: RecordId,
    attributes: Item,
    refs: Vec<String>,
    created_at: Timestamp,
    modified_at: AtomicI64,
    version: AtomicU64,
    created: AtomicBool,
    lock: AtomicBool,
    populated: HashMap<String, Record<K>>,
}

impl<K: EntityKind> Record<K> {
    /// Builds a record that has never been stored, with a fresh id and the
    /// kind's declared references.
    pub async fn new(table: Arc<dyn TableBackend>, kind: K, raw: Item) -> RecordResult<Self> {
        let refs = kind.refs().iter().map(|r| r.to_string()).collect();
        Self::construct(table, kind, raw, refs, false).await
    }

    /// General constructor.
    ///
    /// Reserved keys are removed from `raw` and the rest is normalized through
    /// the kind's schema (no validation yet). A `persisted` record reuses the
    /// `id` found in `raw`, along with any stored timestamps and version; a new
    /// record gets a fresh id and is stamped now.
    pub async fn construct(
        table: Arc<dyn TableBackend>,
        kind: K,
        mut raw: Item,
        refs: Vec<String>,
        persisted: bool,
    ) -> RecordResult<Self> {
        let now = Timestamp::now();
        let (id, created_at, modified_at, version) = if persisted {
            let id = match raw.get(ID_ATTR) {
                Some(Value::String(id)) if !id.is_empty() => RecordId::from(id.as_str()),
                _ => {
                    return Err(RecordError::InvalidData(
                        "persisted record has no string id".to_string(),
                    ));
                }
            };
            (
                id,
                stored_timestamp(&raw, CREATED_AT_ATTR).unwrap_or(now),
                stored_timestamp(&raw, MODIFIED_AT_ATTR).unwrap_or(now),
                raw.get(VERSION_ATTR).and_then(Value::as_u64).unwrap_or(0),
            )
        } else {
            (RecordId::new(), now, now, 0)
        };

        raw.retain(|name, _| !is_reserved(name));
        let schema = kind.schema();
        let attributes = schema.parse(raw).await?;

        Ok(Self {
            table,
            kind,
            schema,
            id,
            attributes,
            refs,
            created_at,
            modified_at: AtomicI64::new(modified_at.as_millis()),
            version: AtomicU64::new(version),
            created: AtomicBool::new(persisted),
            lock: AtomicBool::new(false),
            populated: HashMap::new(),
        })
    }

    /// Rebuilds a stored row as a record of whichever kind its `type` names.
    pub async fn rehydrate(table: Arc<dyn TableBackend>, item: Item) -> RecordResult<Self> {
        let kind: K = kind_of(&item)?;
        let refs = kind.refs().iter().map(|r| r.to_string()).collect();
        Self::construct(table, kind, item, refs, true).await
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn discriminator(&self) -> &'static str {
        self.kind.discriminator()
    }

    pub fn attributes(&self) -> &Item {
        &self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Names of the attributes treated as references.
    pub fn refs(&self) -> &[String] {
        &self.refs
    }

    pub fn table(&self) -> &Arc<dyn TableBackend> {
        &self.table
    }

    /// True once an insert has been confirmed by the backend.
    pub fn is_created(&self) -> bool {
        self.created.load(Ordering::Acquire)
    }

    /// True while a save on this instance is in flight.
    pub fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Acquire)
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn modified_at(&self) -> Timestamp {
        Timestamp::from_millis(self.modified_at.load(Ordering::Acquire))
    }

    /// Last version confirmed by the backend. Zero before the first insert.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// References resolved by the last populate, keyed by reference name.
    pub fn populated(&self) -> &HashMap<String, Record<K>> {
        &self.populated
    }

    pub fn populated_ref(&self, name: &str) -> Option<&Record<K>> {
        self.populated.get(name)
    }

    // ── Attribute mutation ───────────────────────────────────────

    /// Sets an attribute in memory. Reserved row keys cannot be set.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> RecordResult<()> {
        let name = name.into();
        if is_reserved(&name) {
            return Err(RecordError::InvalidData(format!(
                "'{name}' is managed by the record layer"
            )));
        }
        self.attributes.insert(name, value.into());
        Ok(())
    }

    /// Removes an attribute in memory, returning its old value.
    ///
    /// A removed attribute is simply left out of the next partial update, so
    /// its stored value survives.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Validates and writes the record: a full insert the first time, a
    /// partial update afterwards.
    ///
    /// Fails with [`RecordError::Locked`] without touching the table if
    /// another save on this instance is still running.
    pub async fn save(&self) -> RecordResult<()> {
        let _guard = WriteGuard::try_acquire(&self.lock).ok_or(RecordError::Locked)?;
        if self.is_created() {
            self.update_row().await
        } else {
            self.insert_row().await
        }
    }

    async fn insert_row(&self) -> RecordResult<()> {
        self.schema.validate(&self.attributes).await?;

        let mut item = self.attributes.clone();
        item.insert(TYPE_ATTR.to_string(), Value::from(self.discriminator()));
        item.insert(ID_ATTR.to_string(), Value::from(self.id.as_str()));
        item.insert(CREATED_AT_ATTR.to_string(), self.created_at.to_value());
        item.insert(MODIFIED_AT_ATTR.to_string(), self.modified_at().to_value());
        item.insert(VERSION_ATTR.to_string(), Value::from(1_u64));

        self.table.put(item).await?;
        self.version.store(1, Ordering::Release);
        self.created.store(true, Ordering::Release);
        debug!("Inserted {} {}", self.discriminator(), self.id);
        Ok(())
    }

    async fn update_row(&self) -> RecordResult<()> {
        self.schema.validate(&self.attributes).await?;

        let mut changes: Item = self
            .attributes
            .iter()
            .filter(|(_, value)| is_truthy(value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let now = Timestamp::now();
        let current = self.version();
        let next = current + 1;
        changes.insert(MODIFIED_AT_ATTR.to_string(), now.to_value());
        changes.insert(VERSION_ATTR.to_string(), Value::from(next));

        let condition = if current == 0 {
            Condition::absent(VERSION_ATTR)
        } else {
            Condition::equals(VERSION_ATTR, current)
        };

        match self.table.update(self.id.as_str(), changes, Some(&condition)).await {
            Ok(_) => {
                self.modified_at.store(now.as_millis(), Ordering::Release);
                self.version.store(next, Ordering::Release);
                debug!("Updated {} {} to version {}", self.discriminator(), self.id, next);
                Ok(())
            }
            Err(e) if e.is_condition_failed() => Err(RecordError::Conflict {
                id: self.id.to_string(),
                expected_version: current,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the row, provided it still carries this record's id.
    ///
    /// The instance itself is left untouched and should be discarded.
    pub async fn del(&self) -> RecordResult<()> {
        let condition = Condition::equals(ID_ATTR, self.id.as_str());
        self.table.delete(self.id.as_str(), Some(&condition)).await?;
        debug!("Deleted {} {}", self.discriminator(), self.id);
        Ok(())
    }

    // ── Lookup ───────────────────────────────────────────────────

    /// Scans the table and rehydrates every matching row into its own kind.
    ///
    /// Without a filter every row is returned. A row whose discriminator no
    /// kind claims fails the whole call.
    pub async fn find(
        table: &Arc<dyn TableBackend>,
        filter: Option<&Filter>,
    ) -> RecordResult<Vec<Self>> {
        let items = table.scan(filter).await?;
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            records.push(Self::rehydrate(Arc::clone(table), item).await?);
        }
        debug!("Found {} records in {}", records.len(), table.table_name());
        Ok(records)
    }

    /// Like [`find`](Self::find), scoped to one kind's discriminator.
    pub async fn find_kind(
        table: &Arc<dyn TableBackend>,
        kind: K,
        filter: Option<&Filter>,
    ) -> RecordResult<Vec<Self>> {
        let filter = filter
            .cloned()
            .unwrap_or_default()
            .with_type(kind.discriminator());
        Self::find(table, Some(&filter)).await
    }

    /// Returns the record with the given id, if any.
    pub async fn find_by_id(
        table: &Arc<dyn TableBackend>,
        id: impl AsRef<str>,
    ) -> RecordResult<Option<Self>> {
        let filter = Filter::by_id(id);
        Ok(Self::find(table, Some(&filter)).await?.into_iter().next())
    }

    // ── References ───────────────────────────────────────────────

    /// Resolves every reference attribute with its own table read.
    ///
    /// A reference whose target does not exist, or that holds no value, ends
    /// up absent from [`populated`](Self::populated).
    pub async fn populate(&mut self) -> RecordResult<()> {
        let table = Arc::clone(&self.table);
        for name in self.refs.clone() {
            let Some(target) = self.reference_target(&name) else {
                self.populated.remove(&name);
                continue;
            };
            let filter = Filter::new().where_eq(ID_ATTR, target);
            match Self::find(&table, Some(&filter)).await?.into_iter().next() {
                Some(resolved) => {
                    self.populated.insert(name, resolved);
                }
                None => {
                    self.populated.remove(&name);
                }
            }
        }
        Ok(())
    }

    /// Resolves the references of every record against a single full scan.
    ///
    /// Produces the same `populated` maps as calling [`populate`](Self::populate)
    /// on each record, for one table read in total.
    pub async fn populate_all(
        table: &Arc<dyn TableBackend>,
        records: &mut [Self],
    ) -> RecordResult<()> {
        let snapshot = table.scan(None).await?;
        for record in records.iter_mut() {
            for name in record.refs.clone() {
                let Some(target) = record.reference_target(&name) else {
                    record.populated.remove(&name);
                    continue;
                };
                match snapshot.iter().find(|row| row.get(ID_ATTR) == Some(&target)) {
                    Some(row) => {
                        let resolved = Self::rehydrate(Arc::clone(table), row.clone()).await?;
                        record.populated.insert(name, resolved);
                    }
                    None => {
                        record.populated.remove(&name);
                    }
                }
            }
        }
        debug!(
            "Populated {} records against {} rows",
            records.len(),
            snapshot.len()
        );
        Ok(())
    }

    fn reference_target(&self, name: &str) -> Option<Value> {
        self.attributes
            .get(name)
            .filter(|value| !is_empty_reference(value))
            .cloned()
    }

    // ── Serialization ────────────────────────────────────────────

    /// Attributes plus row metadata, with each populated reference expanded
    /// in place of its id. The write flag, persisted flag and reference list
    /// are never included.
    pub fn to_json(&self) -> Value {
        let mut out = self.attributes.clone();
        out.insert(ID_ATTR.to_string(), Value::from(self.id.as_str()));
        out.insert(TYPE_ATTR.to_string(), Value::from(self.discriminator()));
        out.insert(CREATED_AT_ATTR.to_string(), self.created_at.to_value());
        out.insert(MODIFIED_AT_ATTR.to_string(), self.modified_at().to_value());
        out.insert(VERSION_ATTR.to_string(), Value::from(self.version()));
        for (name, resolved) in &self.populated {
            out.insert(name.clone(), resolved.to_json());
        }
        Value::Object(out)
    }
}

fn stored_timestamp(raw: &Item, name: &str) -> Option<Timestamp> {
    raw.get(name).and_then(|v| Timestamp::from_value(v).ok())
}

impl<K: EntityKind> Serialize for Record<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<K: EntityKind> fmt::Display for Record<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<K: EntityKind> fmt::Debug for Record<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("attributes", &self.attributes)
            .field("created", &self.is_created())
            .field("version", &self.version())
            .field("populated", &self.populated.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
