//! Multi-line severity logger.
//!
//! Text is split on newlines and every non-empty line becomes its own log
//! record. Lines can additionally be echoed to the console, which is how
//! debug output reaches the terminal without a severity attached.

use std::fmt;
use std::io::{self, Write};

/// Syslog-style severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    /// Short syslog name of the severity.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "EMERG",
            Self::Alert => "ALERT",
            Self::Critical => "CRIT",
            Self::Error => "ERR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for single log lines.
pub trait LogSink {
    /// Emit one line at the given severity.
    fn emit(&self, severity: Severity, line: &str);
}

/// Sink that forwards lines as `tracing` events.
///
/// Severities above `Error` collapse onto the ERROR level; the syslog name is
/// kept in the `severity` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, severity: Severity, line: &str) {
        match severity {
            Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
                tracing::error!(severity = %severity, "{line}");
            }
            Severity::Warning => tracing::warn!(severity = %severity, "{line}"),
            Severity::Notice | Severity::Info => tracing::info!(severity = %severity, "{line}"),
            Severity::Debug => tracing::debug!(severity = %severity, "{line}"),
        }
    }
}

/// Log a (multi-line) message through the process-wide tracing sink.
///
/// With `severity` set to `None` nothing reaches the sink, so the text is only
/// visible when `echo` prints it to stdout.
pub fn trace_lines(text: &str, severity: Option<Severity>, echo: bool) {
    // Write errors on stdout are discarded.
    let _ = trace_lines_to(&TracingSink, &mut io::stdout().lock(), text, severity, echo);
}

/// Log a (multi-line) message to an explicit sink and console writer.
pub fn trace_lines_to<S, W>(
    sink: &S,
    out: &mut W,
    text: &str,
    severity: Option<Severity>,
    echo: bool,
) -> io::Result<()>
where
    S: LogSink + ?Sized,
    W: Write,
{
    for line in text.split('\n').filter(|line| !line.is_empty()) {
        if let Some(severity) = severity {
            sink.emit(severity, line);
        }
        if echo {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}
