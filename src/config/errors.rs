//! Configuration error types (spec §7 `ConfigError`).

use std::fmt;

/// Error raised when `.dsgconfig.yml` or a user config file is missing,
/// malformed, or names an unrecognized transport.
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    /// Builds a config error.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DSG_CONFIG: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
