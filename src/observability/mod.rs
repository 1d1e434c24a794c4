//! Logging infrastructure.
//!
//! Provides:
//! - Structured tracing setup for the binary and tests
//! - The multi-line severity logger used by the storage layer

pub mod logger;
pub mod tracing;

pub use logger::{trace_lines, LogSink, Severity, TracingSink};
