//! rowkeep: inspect and edit the shared record table
//!
//! Usage:
//!   rowkeep --db records.duckdb scan --where type=User
//!   rowkeep --db records.duckdb get 0192f5c4-...
//!
//! `--db` and `--table` fall back to `ROWKEEP_DB_PATH` and `ROWKEEP_TABLE`.

use anyhow::{Context, Result};
use clap::Parser;
use rowkeep_cli::{run, Command};
use rowkeep_storage::{open_table, TableConfig};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rowkeep")]
#[command(about = "Inspect and edit a rowkeep table")]
struct Args {
    /// DuckDB database file (in-memory when neither this nor ROWKEEP_DB_PATH is set)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Name of the shared table
    #[arg(short, long)]
    table: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let mut config = TableConfig::from_env();
    if let Some(db) = args.db {
        config.path = Some(db);
    }
    if let Some(table) = args.table {
        config.table_name = table;
    }
    debug!("Opening table {} at {:?}", config.table_name, config.path);

    let table = open_table(&config)
        .with_context(|| format!("failed to open table '{}'", config.table_name))?;
    let mut stdout = std::io::stdout().lock();
    run(table.as_ref(), args.command, &mut stdout).await
}
