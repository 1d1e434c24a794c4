//! Configuration parsing for the rowstore binary.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - A home-relative default database path

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::{ConflictPolicy, StoreOptions, DEFAULT_INDEX_FIELD};

/// Largest `--busy-timeout-secs` SQLite can honor.
pub const MAX_BUSY_TIMEOUT_SECS: u64 = 2_147_483;

/// Database file used when none is configured, relative to the home directory.
pub const DEFAULT_DATABASE: &str = ".local/databasefile";

/// Rowstore: queued SQLite row inserts with duplicate handling.
#[derive(Parser, Debug, Clone)]
#[command(name = "rowstore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Config {
    /// SQLite database file
    #[arg(short, long, env = "ROWSTORE_DATABASE", default_value_os_t = default_database_path())]
    pub database: PathBuf,

    /// Table holding the rows
    #[arg(short, long, env = "ROWSTORE_TABLE", default_value = "data")]
    pub table: String,

    /// Echo every log line to stdout
    #[arg(long, env = "ROWSTORE_DEBUG")]
    pub debug: bool,

    /// Seconds to wait for a locked database before failing
    #[arg(
        long,
        env = "ROWSTORE_BUSY_TIMEOUT_SECS",
        default_value_t = 9000,
        value_parser = clap::value_parser!(u64).range(1..=MAX_BUSY_TIMEOUT_SECS)
    )]
    pub busy_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect and print the SQLite version
    Version,
    /// Print the local time of the newest sample in the table
    Latest,
    /// Insert rows from a JSON array of objects
    Insert {
        /// JSON file holding the rows
        file: PathBuf,
        /// Duplicate handling: ignore or replace
        #[arg(short, long, default_value = "ignore")]
        policy: ConflictPolicy,
        /// Field identifying a row when replacing duplicates
        #[arg(short, long, default_value = DEFAULT_INDEX_FIELD)]
        index: String,
        /// SQL script creating the table, run before inserting
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
    /// Print a text file without its trailing newlines
    Cat {
        /// File to print
        path: PathBuf,
    },
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Store options for the configured database and table.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::new(&self.database, &self.table)
            .with_debug(self.debug)
            .with_busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

/// `~/.local/databasefile`, or the bare relative path without a home directory.
pub fn default_database_path() -> PathBuf {
    dirs::home_dir().map_or_else(
        || PathBuf::from(DEFAULT_DATABASE),
        |home| home.join(DEFAULT_DATABASE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["rowstore", "version"]).unwrap();
        assert_eq!(config.table, "data");
        assert_eq!(config.busy_timeout_secs, 9000);
        assert!(config.database.ends_with(DEFAULT_DATABASE));
        assert_eq!(config.command, Command::Version);
    }

    #[test]
    fn test_insert_arguments() {
        let config = Config::try_parse_from([
            "rowstore",
            "--database",
            "/tmp/x.db",
            "--table",
            "weather",
            "insert",
            "rows.json",
            "--policy",
            "replace",
        ])
        .unwrap();

        assert_eq!(config.database, PathBuf::from("/tmp/x.db"));
        assert_eq!(
            config.command,
            Command::Insert {
                file: PathBuf::from("rows.json"),
                policy: ConflictPolicy::Replace,
                index: DEFAULT_INDEX_FIELD.to_string(),
                schema: None,
            }
        );

        let options = config.store_options();
        assert_eq!(options.table, "weather");
        assert_eq!(options.busy_timeout, Duration::from_secs(9000));
    }

    #[test]
    fn test_busy_timeout_bounds() {
        let config =
            Config::try_parse_from(["rowstore", "--busy-timeout-secs", "2147483", "version"])
                .unwrap();
        assert_eq!(config.busy_timeout_secs, MAX_BUSY_TIMEOUT_SECS);

        for bad in ["0", "3000000"] {
            let result =
                Config::try_parse_from(["rowstore", "--busy-timeout-secs", bad, "version"]);
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = Config::try_parse_from(["rowstore", "insert", "rows.json", "-p", "merge"]);
        assert!(result.is_err());
    }
}
