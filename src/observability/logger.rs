//! Structured JSON logger for dsg-core
//!
//! - Structured logs (JSON)
//! - Deterministic key ordering (alphabetical)
//! - Explicit severity levels
//! - One log line = one event
//! - Synchronous, no buffering

use std::fmt;
use std::io::{self, Write};

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that emits one JSON object per line.
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields.
    ///
    /// Fields are output in deterministic order (alphabetical by key).
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::log_to_writer(severity, event, fields, &mut io::stderr());
    }

    /// Log to an arbitrary writer; used by tests to capture output.
    pub fn log_to_writer(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut impl Write,
    ) {
        let mut sorted: Vec<&(&str, &str)> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        let mut line = String::new();
        line.push('{');
        line.push_str(&format!(
            "\"severity\":\"{}\",\"event\":\"{}\"",
            severity,
            escape(event)
        ));
        for (key, value) in sorted {
            line.push_str(&format!(",\"{}\":\"{}\"", key, escape(value)));
        }
        line.push('}');

        let _ = writeln!(writer, "{}", line);
    }

    /// Convenience wrapper for phase-transition events in the transaction log.
    pub fn phase_start(phase: &str) {
        Self::log(Severity::Info, "phase_start", &[("phase", phase)]);
    }

    /// Convenience wrapper for phase-transition events in the transaction log.
    pub fn phase_complete(phase: &str) {
        Self::log(Severity::Info, "phase_complete", &[("phase", phase)]);
    }

    /// Convenience wrapper for rollback events.
    pub fn rollback(phase: &str, reason: &str) {
        Self::log(Severity::Warn, "rollback", &[("phase", phase), ("reason", reason)]);
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
