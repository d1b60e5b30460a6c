//! Commands behind the `rowkeep` binary.
//!
//! Every command works on raw rows: no schema or entity kind is involved, so
//! the tool can inspect and repair any table the record layer writes.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use rowkeep_storage::TableBackend;
use rowkeep_types::{Filter, Item, ID_ATTR, TYPE_ATTR};
use serde_json::Value;
use std::io::Write;
use tracing::debug;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print every row matching all `--where` pairs
    Scan {
        /// Attribute equality, as key=value (repeatable)
        #[arg(short = 'w', long = "where", value_parser = parse_where)]
        conditions: Vec<(String, Value)>,
    },
    /// Print the row with the given id
    Get { id: String },
    /// Delete the row with the given id
    Delete { id: String },
    /// Write a JSON object as a row, replacing any row with the same id
    Put { json: String },
}

/// Parses `key=value`. The value is read as JSON when it parses, so `age=30`
/// matches a number and `active=true` a boolean; anything else is a string.
/// `id` and `type` are always strings.
pub fn parse_where(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = if key == ID_ATTR || key == TYPE_ATTR {
        Value::from(value)
    } else {
        serde_json::from_str(value).unwrap_or_else(|_| Value::from(value))
    };
    Ok((key.to_string(), value))
}

/// Runs one command against `table`, writing one JSON document per line.
pub async fn run(table: &dyn TableBackend, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Scan { conditions } => {
            let filter: Filter = conditions.into_iter().collect();
            let filter = (!filter.is_empty()).then_some(filter);
            let rows = table.scan(filter.as_ref()).await?;
            debug!("Scan of {} returned {} rows", table.table_name(), rows.len());
            for row in rows {
                write_line(out, &Value::Object(row))?;
            }
        }
        Command::Get { id } => {
            let filter = Filter::by_id(&id);
            let Some(row) = table.scan(Some(&filter)).await?.into_iter().next() else {
                bail!("no row with id '{id}' in {}", table.table_name());
            };
            write_line(out, &Value::Object(row))?;
        }
        Command::Delete { id } => {
            table
                .delete(&id, None)
                .await
                .with_context(|| format!("failed to delete '{id}'"))?;
            write_line(out, &serde_json::json!({ "deleted": id }))?;
        }
        Command::Put { json } => {
            let row = parse_row(&json)?;
            table.put(row.clone()).await.context("failed to write row")?;
            write_line(out, &Value::Object(row))?;
        }
    }
    Ok(())
}

fn parse_row(json: &str) -> Result<Item> {
    let value: Value = serde_json::from_str(json).context("row is not valid JSON")?;
    let Value::Object(row) = value else {
        bail!("row must be a JSON object");
    };
    match row.get(ID_ATTR) {
        Some(Value::String(id)) if !id.is_empty() => Ok(row),
        _ => bail!("row must carry a non-empty string '{ID_ATTR}'"),
    }
}

fn write_line(out: &mut impl Write, value: &Value) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
