//! DuckDB-backed table.
//!
//! Every row is kept whole as a JSON document next to its partition key and
//! discriminator:
//!
//! ```sql
//! CREATE TABLE records (id VARCHAR PRIMARY KEY, entity_type VARCHAR, data VARCHAR NOT NULL)
//! ```
//!
//! `id` and `type` clauses of a scan filter are pushed down into SQL; the
//! remaining clauses are applied to the decoded rows. Conditional writes read,
//! check and write while holding the connection lock, so they are atomic with
//! respect to every other writer sharing this connection.

use crate::backend::{item_id, merge_update, require_row, Condition, TableBackend};
use crate::config::{validate_table_name, TableConfig};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use duckdb::{params, Connection};
use rowkeep_types::{Filter, Item, ID_ATTR, TYPE_ATTR};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Table backend over a DuckDB connection.
pub struct DuckTable {
    conn: Arc<Mutex<Connection>>,
    name: String,
}

impl DuckTable {
    /// Opens the table described by `config`, creating it if needed.
    pub fn open(config: &TableConfig) -> StorageResult<Self> {
        config.validate()?;
        let conn = match &config.path {
            Some(path) => crate::open_duckdb_with_wal_recovery(path)?,
            None => Connection::open_in_memory()?,
        };
        Self::open_with_conn(Arc::new(Mutex::new(conn)), &config.table_name)
    }

    /// Opens a fresh in-memory database holding one table.
    pub fn open_in_memory(table_name: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::open_with_conn(Arc::new(Mutex::new(conn)), table_name)
    }

    /// Uses an existing connection, which may be shared with other tables.
    pub fn open_with_conn(conn: Arc<Mutex<Connection>>, table_name: &str) -> StorageResult<Self> {
        validate_table_name(table_name)?;
        let table = Self {
            conn,
            name: table_name.to_string(),
        };
        table.init_schema()?;
        Ok(table)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                id VARCHAR PRIMARY KEY,
                entity_type VARCHAR,
                data VARCHAR NOT NULL
            );",
            self.name
        ))?;
        Ok(())
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = self.name.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::Poisoned)?;
            f(&guard, &table)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

fn decode_row(data: &str) -> StorageResult<Item> {
    Ok(serde_json::from_str(data)?)
}

fn read_row(conn: &Connection, table: &str, id: &str) -> StorageResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("SELECT data FROM \"{table}\" WHERE id = ?"))?;
    let mut rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
    match rows.next() {
        Some(data) => Ok(Some(decode_row(&data?)?)),
        None => Ok(None),
    }
}

fn write_row(conn: &Connection, table: &str, id: &str, item: &Item) -> StorageResult<()> {
    let entity_type = item.get(TYPE_ATTR).and_then(Value::as_str).map(str::to_string);
    let data = serde_json::to_string(item)?;
    conn.execute(
        &format!("INSERT OR REPLACE INTO \"{table}\" (id, entity_type, data) VALUES (?, ?, ?)"),
        params![id, entity_type, data],
    )?;
    Ok(())
}

fn scan_rows(conn: &Connection, table: &str, filter: Option<&Filter>) -> StorageResult<Vec<Item>> {
    let id = filter.and_then(|f| f.get(ID_ATTR)).and_then(Value::as_str);
    let entity_type = filter.and_then(|f| f.get(TYPE_ATTR)).and_then(Value::as_str);

    let mut sql = format!("SELECT data FROM \"{table}\"");
    let mut args: Vec<String> = Vec::new();
    let mut clauses: Vec<&str> = Vec::new();
    if let Some(id) = id {
        clauses.push("id = ?");
        args.push(id.to_string());
    }
    if let Some(entity_type) = entity_type {
        clauses.push("entity_type = ?");
        args.push(entity_type.to_string());
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(duckdb::params_from_iter(args), |row| row.get::<_, String>(0))?;
    let mut items = Vec::new();
    for data in rows {
        let item = decode_row(&data?)?;
        if filter.is_none_or(|f| f.matches(&item)) {
            items.push(item);
        }
    }
    Ok(items)
}

#[async_trait]
impl TableBackend for DuckTable {
    fn table_name(&self) -> &str {
        &self.name
    }

    async fn scan(&self, filter: Option<&Filter>) -> StorageResult<Vec<Item>> {
        let filter = filter.cloned();
        let items = self
            .with_conn(move |conn, table| scan_rows(conn, table, filter.as_ref()))
            .await?;
        debug!("scan {} -> {} rows", self.name, items.len());
        Ok(items)
    }

    async fn put(&self, item: Item) -> StorageResult<()> {
        let id = item_id(&item)?;
        self.with_conn(move |conn, table| write_row(conn, table, &id, &item))
            .await
    }

    async fn update(
        &self,
        id: &str,
        attrs: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<Item> {
        let id = id.to_string();
        let condition = condition.cloned();
        self.with_conn(move |conn, table| {
            let current = read_row(conn, table, &id)?;
            let mut row = require_row(&id, current.as_ref(), condition.as_ref())?.clone();
            merge_update(&mut row, attrs);
            write_row(conn, table, &id, &row)?;
            Ok(row)
        })
        .await
    }

    async fn delete(&self, id: &str, condition: Option<&Condition>) -> StorageResult<()> {
        let id = id.to_string();
        let condition = condition.cloned();
        self.with_conn(move |conn, table| {
            let current = read_row(conn, table, &id)?;
            require_row(&id, current.as_ref(), condition.as_ref())?;
            conn.execute(&format!("DELETE FROM \"{table}\" WHERE id = ?"), params![id])?;
            Ok(())
        })
        .await
    }
}
