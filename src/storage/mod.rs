//! SQLite storage layer for Rowstore.
//!
//! Provides:
//! - Row records and their scalar values
//! - The pending FIFO queue
//! - Short-lived connection setup
//! - The table-bound [`RowStore`] with duplicate handling

pub mod connection;
pub mod queue;
pub mod row;
pub mod store;

pub use row::{Row, RowError, Value};
pub use store::{
    ConflictPolicy, RowStore, StoreError, StoreOptions, DEFAULT_INDEX_FIELD, EPOCH_COLUMN,
    TIMESTAMP_FORMAT,
};
