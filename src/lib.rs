//! Rowstore: queued SQLite row inserts with duplicate handling.
//!
//! Rows are collected in memory and flushed into a single SQLite table,
//! resolving uniqueness conflicts by either keeping the stored row or
//! replacing it.
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`fileio`]: Whole-file text reading
//! - [`observability`]: Tracing setup and the multi-line severity logger
//! - [`storage`]: Row queue, connections and the [`storage::RowStore`]

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::store::StoreOptions is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod config;
pub mod fileio;
pub mod observability;
pub mod storage;

pub use storage::{ConflictPolicy, Row, RowStore, StoreError, StoreOptions, Value};
