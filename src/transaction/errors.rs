//! TransactionError: staging, verify, or commit failures (spec §7).

use std::fmt;
use std::io;

/// Error raised while executing a sync transaction. Carries the phase it
/// occurred in so the caller (and the structured log) can report exactly
/// where execution stopped.
#[derive(Debug)]
pub struct TransactionError {
    message: String,
    phase: Option<&'static str>,
    source: Option<io::Error>,
}

impl TransactionError {
    /// Builds a transaction error with no phase or I/O source attached.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), phase: None, source: None }
    }

    /// Attaches the phase name this error occurred in.
    pub fn in_phase(mut self, phase: &'static str) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Builds a transaction error wrapping an I/O source.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self { message: message.into(), phase: None, source: Some(source) }
    }

    /// The phase this error occurred in, if known.
    pub fn phase(&self) -> Option<&'static str> {
        self.phase
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "DSG_TRANSACTION[{phase}]: {}", self.message),
            None => write!(f, "DSG_TRANSACTION: {}", self.message),
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<crate::backend::BackendError> for TransactionError {
    fn from(e: crate::backend::BackendError) -> Self {
        TransactionError::new(e.to_string())
    }
}

impl From<crate::transport::TransportError> for TransactionError {
    fn from(e: crate::transport::TransportError) -> Self {
        TransactionError::new(e.to_string())
    }
}

impl From<crate::manifest::IntegrityError> for TransactionError {
    fn from(e: crate::manifest::IntegrityError) -> Self {
        TransactionError::new(e.to_string())
    }
}

impl From<crate::history::HistoryError> for TransactionError {
    fn from(e: crate::history::HistoryError) -> Self {
        TransactionError::new(e.to_string())
    }
}

impl From<crate::scanner::ScanError> for TransactionError {
    fn from(e: crate::scanner::ScanError) -> Self {
        TransactionError::new(e.to_string())
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
