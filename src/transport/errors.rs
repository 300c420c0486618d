//! Transport error types (spec §7 `AccessError`).

use std::fmt;
use std::io;

/// Error reaching the backend: missing credentials, unreachable host,
/// insufficient privileges, or a failed command invocation.
#[derive(Debug)]
pub struct TransportError {
    message: String,
    source: Option<io::Error>,
    /// Whether this error is eligible for the bounded exponential-backoff
    /// retry policy (spec §7: only `AccessError` on remote command
    /// channels is retried automatically).
    pub retryable: bool,
}

impl TransportError {
    /// Builds a non-retryable transport error.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None, retryable: false }
    }

    /// Builds a retryable transport error (e.g. a transient command-channel
    /// failure).
    pub fn retryable(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None, retryable: true }
    }

    /// Builds a transport error wrapping an I/O source.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self { message: message.into(), source: Some(source), retryable: true }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DSG_ACCESS: {}", self.message)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
