//! SnapshotBackend error types.

use std::fmt;
use std::io;

/// Error raised by a `SnapshotBackend` operation.
#[derive(Debug)]
pub struct BackendError {
    message: String,
    source: Option<io::Error>,
}

impl BackendError {
    /// Builds a backend error with no I/O source.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Builds a backend error wrapping an I/O source.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self { message: message.into(), source: Some(source) }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DSG_BACKEND: {}", self.message)
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
