//! Filename-validation error types.

use std::fmt;

/// Severity levels for validation errors.
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

/// The reason a path failed validation. Closed set, matching the
/// disallowed-character categories in spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCause {
    /// A control character (0x00-0x1F, 0x7F) in a path component.
    ControlCharacter,
    /// A Windows-reserved basename (CON, PRN, AUX, NUL, COM1-9, LPT1-9).
    ReservedName,
    /// One of `<>:"|?*\`.
    IllegalCharacter,
    /// Leading or trailing whitespace in a component.
    Whitespace,
    /// Trailing `~` (editor backup marker).
    TrailingTilde,
    /// A Unicode line or paragraph separator.
    LineSeparator,
    /// A bidirectional control character.
    BidiControl,
    /// A zero-width character.
    ZeroWidth,
    /// The path is not NFC-normalized.
    NonNfc,
    /// The path is absolute, contains `..`, or otherwise escapes the root.
    PathEscape,
}

impl ValidationCause {
    /// Human-readable cause, as surfaced in scan warnings.
    pub fn description(&self) -> &'static str {
        match self {
            ValidationCause::ControlCharacter => "contains a control character",
            ValidationCause::ReservedName => "uses a Windows-reserved name",
            ValidationCause::IllegalCharacter => "contains an illegal character (<>:\"|?*\\)",
            ValidationCause::Whitespace => "has leading or trailing whitespace",
            ValidationCause::TrailingTilde => "ends with a tilde (editor backup marker)",
            ValidationCause::LineSeparator => "contains a Unicode line/paragraph separator",
            ValidationCause::BidiControl => "contains a bidirectional control character",
            ValidationCause::ZeroWidth => "contains a zero-width character",
            ValidationCause::NonNfc => "is not NFC-normalized",
            ValidationCause::PathEscape => "escapes the repository root",
        }
    }
}

/// A single validation warning: one offending path and its cause(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The offending relative path.
    pub path: String,
    /// Every cause that applies to this path.
    pub causes: Vec<ValidationCause>,
}

/// Error returned when residual invalid paths remain after normalization,
/// or a path escapes the repository root (spec §7 `ValidationError`).
#[derive(Debug)]
pub struct ValidationError {
    message: String,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationError {
    /// Builds a validation error carrying the residual warnings.
    pub fn residual(warnings: Vec<ValidationWarning>) -> Self {
        Self {
            message: format!("{} path(s) remain invalid after normalization", warnings.len()),
            warnings,
        }
    }

    /// Builds a validation error for a single path-escape violation.
    pub fn path_escape(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("path escapes repository root: {path}"),
            warnings: vec![ValidationWarning {
                path,
                causes: vec![ValidationCause::PathEscape],
            }],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] DSG_VALIDATION: {}", Severity::Error, self.message)
    }
}

impl std::error::Error for ValidationError {}
