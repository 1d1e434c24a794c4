//! Test utilities for Rowstore integration tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - A sample table schema and row builder
//! - Direct table inspection

#![allow(dead_code)]

use rowstore::observability::tracing::init_test_tracing;
use rowstore::storage::{Row, RowStore, StoreOptions};
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Table layout used by the integration tests.
pub const SAMPLE_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS samples (
        sample_time  TEXT PRIMARY KEY,
        sample_epoch INTEGER NOT NULL,
        station      TEXT,
        temperature  REAL
    );
"#;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        init_test_tracing();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Store options for the `samples` table with a short busy timeout.
    pub fn options(&self) -> StoreOptions {
        StoreOptions::new(&self.db_path, "samples")
            .with_schema(SAMPLE_SCHEMA)
            .with_busy_timeout(Duration::from_millis(200))
    }

    /// Open a store and create the `samples` table.
    pub fn store(&self) -> RowStore {
        let store = RowStore::open(self.options()).expect("failed to open store");
        store.initialize_schema().expect("failed to create schema");
        store
    }

    /// Open a raw connection to the fixture database.
    pub fn connection(&self) -> Connection {
        Connection::open(&self.db_path).expect("failed to open connection")
    }

    /// All rows of `samples` as (sample_time, station, temperature), by key.
    pub fn rows(&self) -> Vec<(String, Option<String>, Option<f64>)> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare(
                "SELECT sample_time, station, temperature FROM samples ORDER BY sample_time",
            )
            .expect("prepare failed");
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .expect("query failed")
            .collect::<Result<Vec<_>, _>>()
            .expect("row decode failed")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a sample row.
pub fn sample(time: &str, epoch: i64, station: &str, temperature: f64) -> Row {
    Row::new()
        .with("sample_time", time)
        .with("sample_epoch", epoch)
        .with("station", station)
        .with("temperature", temperature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.temp_dir.path().exists());
        assert!(fixture.db_path.ends_with("test.db"));
    }
}
