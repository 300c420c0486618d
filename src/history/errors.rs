//! HistoryIndex error types.

use std::fmt;
use std::io;

/// Error raised while reading or appending to the history index.
#[derive(Debug)]
pub struct HistoryError {
    message: String,
    source: Option<io::Error>,
}

impl HistoryError {
    /// Builds a history error with no I/O source.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    /// Builds a history error wrapping an I/O source.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self { message: message.into(), source: Some(source) }
    }
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DSG_HISTORY: {}", self.message)
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for history-index operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
