//! Manifest error types.

use std::fmt;
use std::io;

/// Severity levels for manifest errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, caller continues.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Manifest-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestErrorCode {
    /// Serialization or parse failure.
    DsgManifestFormat,
    /// I/O failure reading or writing a manifest file.
    DsgManifestIo,
    /// Entries hash or entry count disagrees with recomputation.
    DsgManifestIntegrity,
    /// Snapshot chain is discontinuous or acyclic invariant is violated.
    DsgManifestChain,
}

impl ManifestErrorCode {
    /// Returns the string code.
    pub fn code(&self) -> &'static str {
        match self {
            ManifestErrorCode::DsgManifestFormat => "DSG_MANIFEST_FORMAT",
            ManifestErrorCode::DsgManifestIo => "DSG_MANIFEST_IO",
            ManifestErrorCode::DsgManifestIntegrity => "DSG_MANIFEST_INTEGRITY",
            ManifestErrorCode::DsgManifestChain => "DSG_MANIFEST_CHAIN",
        }
    }
}

impl fmt::Display for ManifestErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Manifest error with full context.
#[derive(Debug)]
pub struct IntegrityError {
    code: ManifestErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl IntegrityError {
    /// Creates a format error (serialize/parse failure).
    pub fn format(message: impl Into<String>) -> Self {
        Self {
            code: ManifestErrorCode::DsgManifestFormat,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Creates an I/O error with source.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: ManifestErrorCode::DsgManifestIo,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Creates an entries-hash/entry-count mismatch error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self {
            code: ManifestErrorCode::DsgManifestIntegrity,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Creates a snapshot-chain discontinuity error.
    pub fn chain(message: impl Into<String>) -> Self {
        Self {
            code: ManifestErrorCode::DsgManifestChain,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attaches details to this error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ManifestErrorCode {
        self.code
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", Severity::Error, self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for IntegrityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, IntegrityError>;
