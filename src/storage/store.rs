//! Queued row inserts into a single SQLite table.
//!
//! A [`RowStore`] keeps rows in memory until [`RowStore::flush`] writes them,
//! one statement per row, resolving uniqueness conflicts with a
//! [`ConflictPolicy`]. Every public operation opens its own connection and
//! closes it before returning; flush holds one connection for the whole
//! queue.

use chrono::{Local, TimeZone};
use rusqlite::{params, params_from_iter, types, Connection};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::connection::{self, is_unique_violation, quote_ident, DEFAULT_BUSY_TIMEOUT};
use super::queue::PendingQueue;
use super::row::{Row, RowError};
use crate::observability::logger::{trace_lines, Severity};

/// Field used to identify a row when resolving duplicates.
pub const DEFAULT_INDEX_FIELD: &str = "sample_time";

/// Column holding the Unix epoch of each sample.
pub const EPOCH_COLUMN: &str = "sample_epoch";

/// Format of timestamps returned by [`RowStore::latest_timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to {}: {source}", .path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    InvalidRow(#[from] RowError),

    #[error("Unknown conflict policy {0:?} (expected \"ignore\" or \"replace\")")]
    UnknownPolicy(String),

    #[error("Row has no {0:?} field to resolve the duplicate with")]
    MissingIndexField(String),

    #[error("Latest sample_epoch is not a usable epoch: {0}")]
    InvalidEpoch(String),
}

/// How to handle a row whose key already exists in the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Keep the stored row and drop the new one.
    #[default]
    Ignore,
    /// Delete the stored row and insert the new one.
    Replace,
}

impl ConflictPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "replace" => Ok(Self::Replace),
            other => Err(StoreError::UnknownPolicy(other.to_owned())),
        }
    }
}

/// Construction parameters for a [`RowStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Path to the SQLite database file
    pub database: PathBuf,
    /// Table that receives the rows
    pub table: String,
    /// Optional `CREATE TABLE` script for [`RowStore::initialize_schema`]
    pub schema: Option<String>,
    /// Insert statement template kept for callers; flush generates its own
    pub insert: Option<String>,
    /// Echo log lines to stdout
    pub debug: bool,
    /// How long a statement waits on a locked database
    pub busy_timeout: Duration,
}

impl StoreOptions {
    pub fn new(database: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            schema: None,
            insert: None,
            debug: false,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn with_insert(mut self, insert: impl Into<String>) -> Self {
        self.insert = Some(insert.into());
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// A table bound store with an in-memory queue of pending rows.
///
/// Not synchronized: enqueue and flush take `&mut self`, so sharing a store
/// across threads needs an outer lock.
#[derive(Debug)]
pub struct RowStore {
    options: StoreOptions,
    queue: PendingQueue<Row>,
    db_version: Option<String>,
}

impl RowStore {
    /// Create a store without touching the database.
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            queue: PendingQueue::new(),
            db_version: None,
        }
    }

    /// Create a store and verify the database is reachable.
    pub fn open(options: StoreOptions) -> Result<Self, StoreError> {
        let mut store = Self::new(options);
        store.db_version = Some(store.connect_and_report()?);
        Ok(store)
    }

    pub fn database(&self) -> &Path {
        &self.options.database
    }

    pub fn table(&self) -> &str {
        &self.options.table
    }

    pub fn insert_template(&self) -> Option<&str> {
        self.options.insert.as_deref()
    }

    /// SQLite version seen by [`RowStore::open`].
    pub fn db_version(&self) -> Option<&str> {
        self.db_version.as_deref()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queued rows in commit order.
    pub fn pending(&self) -> impl Iterator<Item = &Row> {
        self.queue.iter()
    }

    /// Connect, log the engine version and database path, and disconnect.
    pub fn connect_and_report(&self) -> Result<String, StoreError> {
        let conn = self.connect()?;
        let version: String = conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .map_err(|e| {
                self.query_fault(Severity::Critical, "Unexpected SQLite3 error during test", e)
            })?;
        self.close(conn)?;

        self.log(
            &format!("Attached to SQLite3 server: {version}"),
            Some(Severity::Info),
        );
        self.log(
            &format!("Using DB file             : {}", self.options.database.display()),
            Some(Severity::Info),
        );
        Ok(version)
    }

    /// Run the stored schema script, if any.
    pub fn initialize_schema(&self) -> Result<(), StoreError> {
        let Some(schema) = self.options.schema.as_deref() else {
            return Ok(());
        };
        let conn = self.connect()?;
        conn.execute_batch(schema).map_err(|e| {
            self.query_fault(Severity::Error, "SQLite3 error when creating schema", e)
        })?;
        self.close(conn)
    }

    /// Queue a row for the next flush.
    pub fn enqueue(&mut self, row: Row) {
        self.log(&format!("Queued : {row}"), None);
        self.queue.push(row);
    }

    /// Queue an untyped row, rejecting anything but a flat JSON object.
    ///
    /// The queue is unchanged when the value is rejected.
    pub fn enqueue_value(&mut self, value: serde_json::Value) -> Result<(), StoreError> {
        let row = Row::try_from(value).map_err(|e| {
            self.log(&e.to_string(), Some(Severity::Critical));
            e
        })?;
        self.enqueue(row);
        Ok(())
    }

    /// Write all queued rows to the table, front to back.
    ///
    /// A row is removed from the queue only after it was inserted or its
    /// duplicate was resolved. On error the failing row and every row after
    /// it stay queued while rows already written stay committed.
    pub fn flush(&mut self, policy: ConflictPolicy, index_field: &str) -> Result<(), StoreError> {
        let mut conn = self.connect()?;

        while let Some(row) = self.queue.front() {
            match insert_row(&conn, &self.options.table, row) {
                Ok(_) => self.log(&format!("Inserted : {row}"), None),
                Err(e) if is_unique_violation(&e) => match policy {
                    ConflictPolicy::Ignore => {
                        self.log("Duplicate entry. Not adding to database.", None);
                    }
                    ConflictPolicy::Replace => {
                        self.replace_row(&mut conn, row, index_field)?;
                        self.log(&format!("Replaced : {row}"), None);
                    }
                },
                Err(e) => {
                    return Err(self.query_fault(
                        Severity::Error,
                        "SQLite3 error when committing to server",
                        e,
                    ));
                }
            }
            self.queue.pop();
        }

        self.close(conn)
    }

    /// Local time of the largest `sample_epoch` in the table.
    ///
    /// Returns `None` when the table holds no rows.
    pub fn latest_timestamp(&self) -> Result<Option<String>, StoreError> {
        let table = &self.options.table;
        let conn = self.connect()?;
        let sql = format!("SELECT MAX({EPOCH_COLUMN}) FROM {}", quote_ident(table));
        let max_epoch: types::Value = conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| {
                self.query_fault(Severity::Critical, "Unexpected SQLite3 error during lookup", e)
            })?;
        self.close(conn)?;

        let epoch = match max_epoch {
            types::Value::Null => {
                self.log(&format!("Latest datapoint in {table}: no data"), None);
                return Ok(None);
            }
            types::Value::Integer(i) => i,
            #[allow(clippy::cast_possible_truncation)]
            types::Value::Real(r) if r.is_finite() => r.trunc() as i64,
            other => {
                let err = StoreError::InvalidEpoch(format!("{other:?}"));
                return Err(self.epoch_fault(err));
            }
        };

        let formatted = format_local(epoch).map_err(|e| self.epoch_fault(e))?;
        self.log(
            &format!("Latest datapoint in {table}: {epoch} = {formatted}"),
            None,
        );
        Ok(Some(formatted))
    }

    fn replace_row(
        &self,
        conn: &mut Connection,
        row: &Row,
        index_field: &str,
    ) -> Result<(), StoreError> {
        let Some(key) = row.get(index_field) else {
            self.log(
                &format!("Cannot replace duplicate: row has no {index_field} field."),
                Some(Severity::Error),
            );
            return Err(StoreError::MissingIndexField(index_field.to_owned()));
        };

        let table = &self.options.table;
        let fault = |e: rusqlite::Error| {
            self.query_fault(Severity::Error, "SQLite3 error when replacing row", e)
        };

        let tx = conn.transaction().map_err(fault)?;
        let delete = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(index_field)
        );
        tx.execute(&delete, params![key]).map_err(fault)?;
        insert_row(&tx, table, row).map_err(fault)?;
        tx.commit().map_err(fault)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        connection::open(&self.options.database, self.options.busy_timeout).map_err(|source| {
            self.log(
                "Unexpected SQLite3 error when connecting to server.",
                Some(Severity::Critical),
            );
            self.log(&format!("{source}\n{source:?}"), Some(Severity::Critical));
            StoreError::Connection {
                path: self.options.database.clone(),
                source,
            }
        })
    }

    fn close(&self, conn: Connection) -> Result<(), StoreError> {
        // A failed close hands the connection back; dropping it retries.
        conn.close()
            .map_err(|(_, e)| self.query_fault(Severity::Error, "SQLite3 error when closing", e))
    }

    fn query_fault(
        &self,
        severity: Severity,
        context: &'static str,
        source: rusqlite::Error,
    ) -> StoreError {
        self.log(&format!("{context}."), Some(severity));
        self.log(&format!("{source}\n{source:?}"), Some(severity));
        StoreError::Query { context, source }
    }

    fn epoch_fault(&self, err: StoreError) -> StoreError {
        self.log(
            &format!("Unusable latest datapoint in {}.", self.options.table),
            Some(Severity::Critical),
        );
        self.log(&format!("{err}\n{err:?}"), Some(Severity::Critical));
        err
    }

    fn log(&self, text: &str, severity: Option<Severity>) {
        trace_lines(text, severity, self.options.debug);
    }
}

fn insert_row(conn: &Connection, table: &str, row: &Row) -> rusqlite::Result<usize> {
    let sql = insert_sql(table, row);
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.execute(params_from_iter(row.values()))
}

fn insert_sql(table: &str, row: &Row) -> String {
    if row.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table));
    }
    let columns = row
        .fields()
        .map(|field| quote_ident(field))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=row.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        quote_ident(table)
    )
}

fn format_local(epoch: i64) -> Result<String, StoreError> {
    Local
        .timestamp_opt(epoch, 0)
        .earliest()
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .ok_or_else(|| StoreError::InvalidEpoch(epoch.to_string()))
}
