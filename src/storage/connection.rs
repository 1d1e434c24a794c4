//! Connection setup and SQL helpers.
//!
//! Connections are short-lived: every store operation opens one, uses it and
//! drops it, which closes the handle on every return path.

use rusqlite::{ffi, Connection, ErrorCode, OpenFlags};
use std::path::Path;
use std::time::Duration;

/// Default time to wait for a locked database file (2.5 hours).
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(9000);

/// Longest busy timeout SQLite accepts (`i32::MAX` milliseconds).
pub const MAX_BUSY_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// Open a read-write connection, creating the file if needed.
///
/// Statements block for up to `busy_timeout` while another process holds
/// the write lock. Timeouts beyond [`MAX_BUSY_TIMEOUT`] are clamped to it.
pub fn open<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.busy_timeout(busy_timeout.min(MAX_BUSY_TIMEOUT))?;
    Ok(conn)
}

/// Whether the error is a UNIQUE or PRIMARY KEY constraint failure.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

/// Quote an identifier for use in generated SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let conn = open(&db_path, Duration::from_secs(1)).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        drop(conn);

        assert!(db_path.is_file());
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("missing").join("test.db");

        assert!(open(&db_path, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_open_clamps_oversized_busy_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let conn = open(&db_path, Duration::from_secs(3_000_000)).unwrap();
        let version: String = conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .unwrap();
        assert!(version.starts_with('3'));

        assert!(open(&db_path, Duration::MAX).is_ok());
    }

    #[test]
    fn test_unique_violation_detected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (k TEXT PRIMARY KEY, u TEXT UNIQUE, n INTEGER NOT NULL)",
        )
        .unwrap();
        conn.execute("INSERT INTO t VALUES ('a', 'x', 1)", []).unwrap();

        let pk = conn.execute("INSERT INTO t VALUES ('a', 'y', 1)", []).unwrap_err();
        assert!(is_unique_violation(&pk));

        let unique = conn.execute("INSERT INTO t VALUES ('b', 'x', 1)", []).unwrap_err();
        assert!(is_unique_violation(&unique));

        let not_null = conn.execute("INSERT INTO t VALUES ('c', 'z', NULL)", []).unwrap_err();
        assert!(!is_unique_violation(&not_null));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("data"), "\"data\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
