//! rowstore: inspect and load a SQLite sample table from the command line.
//!
//! # Usage
//!
//! ```bash
//! rowstore --database ./samples.db --table data version
//! rowstore --table data insert rows.json --policy replace --schema schema.sql
//! rowstore --table data latest
//! ```
//!
//! Environment variables can also be used:
//! - `ROWSTORE_DATABASE`: SQLite database file
//! - `ROWSTORE_TABLE`: Table holding the rows
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::{bail, Context, Result};
use rowstore::config::{Command, Config};
use rowstore::fileio::read_text;
use rowstore::observability::tracing::init_tracing;
use rowstore::storage::{RowStore, StoreOptions};

fn main() -> Result<()> {
    let config = Config::parse_args();
    init_tracing(&config.log_level);

    match &config.command {
        Command::Version => {
            let store = RowStore::new(config.store_options());
            println!("{}", store.connect_and_report()?);
        }
        Command::Latest => {
            let store = RowStore::new(config.store_options());
            match store.latest_timestamp()? {
                Some(timestamp) => println!("{timestamp}"),
                None => println!("no data"),
            }
        }
        Command::Insert {
            file,
            policy,
            index,
            schema,
        } => {
            let mut options = config.store_options();
            if let Some(schema) = schema {
                options = with_schema_file(options, schema)?;
            }
            let mut store = RowStore::open(options)?;
            store.initialize_schema()?;

            let count = load_rows(&mut store, file)?;
            store
                .flush(*policy, index)
                .with_context(|| format!("flushing {count} rows into {}", store.table()))?;
            tracing::info!(count, table = store.table(), %policy, "Rows flushed");
        }
        Command::Cat { path } => {
            let text = read_text(path).with_context(|| format!("reading {}", path.display()))?;
            println!("{text}");
        }
    }

    Ok(())
}

fn with_schema_file(options: StoreOptions, path: &std::path::Path) -> Result<StoreOptions> {
    let schema = read_text(path).with_context(|| format!("reading {}", path.display()))?;
    if schema.is_empty() {
        bail!("schema file {} is missing or empty", path.display());
    }
    Ok(options.with_schema(schema))
}

/// Queue every element of the JSON array in `path`, returning how many.
fn load_rows(store: &mut RowStore, path: &std::path::Path) -> Result<usize> {
    let text = read_text(path).with_context(|| format!("reading {}", path.display()))?;
    if text.is_empty() {
        bail!("row file {} is missing or empty", path.display());
    }

    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let serde_json::Value::Array(rows) = value else {
        bail!("row file {} must hold a JSON array", path.display());
    };

    let count = rows.len();
    for (i, row) in rows.into_iter().enumerate() {
        store
            .enqueue_value(row)
            .with_context(|| format!("row {i} of {}", path.display()))?;
    }
    Ok(count)
}
