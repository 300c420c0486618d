//! Scanner error types.

use std::fmt;
use std::io;

/// Error raised while walking the working tree.
#[derive(Debug)]
pub struct ScanError {
    message: String,
    source: Option<io::Error>,
}

impl ScanError {
    /// Builds a scan error from an I/O failure encountered at `path`.
    pub fn io(path: &std::path::Path, source: io::Error) -> Self {
        Self {
            message: format!("failed to read {}", path.display()),
            source: Some(source),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DSG_SCAN_IO: {}", self.message)
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;
