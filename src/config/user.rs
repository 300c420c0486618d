//! User-level configuration: personal identity plus optional remote
//! defaults, merged from a system-wide file and a per-user file.
//!
//! Per spec §6, the system-wide file may only supply `default_host`/
//! `default_path`; `user_name`/`user_id` are personal and rejected there.

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};

/// Resolved user identity and optional remote defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Display name recorded in manifest metadata.
    pub user_name: String,
    /// Stable user id, in email form (e.g. `"alice@example.org"`).
    pub user_id: String,
    /// Default remote host, when not given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_host: Option<String>,
    /// Default remote base path, when not given on the command line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_path: Option<String>,
}

impl UserConfig {
    /// Parses a per-user config document, requiring `user_name`/`user_id`.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: UserConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::new(format!("failed to parse user config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.user_name.trim().is_empty() {
            return Err(ConfigError::new("user_name must be non-empty"));
        }
        if !self.user_id.contains('@') {
            return Err(ConfigError::new("user_id must be an email address"));
        }
        Ok(())
    }

    /// Parses a system-wide config document, which may only carry remote
    /// defaults. Presence of `user_name` or `user_id` is an error.
    pub fn system_defaults_from_yaml(yaml: &str) -> ConfigResult<SystemDefaults> {
        let raw: SystemDefaultsRaw = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::new(format!("failed to parse system config: {e}")))?;
        if raw.user_name.is_some() || raw.user_id.is_some() {
            return Err(ConfigError::new(
                "system-wide config may not set user_name or user_id",
            ));
        }
        Ok(SystemDefaults { default_host: raw.default_host, default_path: raw.default_path })
    }

    /// Overlays `defaults` onto `self`, filling in any unset remote fields.
    pub fn with_system_defaults(mut self, defaults: SystemDefaults) -> Self {
        if self.default_host.is_none() {
            self.default_host = defaults.default_host;
        }
        if self.default_path.is_none() {
            self.default_path = defaults.default_path;
        }
        self
    }
}

/// Remote defaults read from the system-wide config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemDefaults {
    /// Default remote host.
    pub default_host: Option<String>,
    /// Default remote base path.
    pub default_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SystemDefaultsRaw {
    user_name: Option<String>,
    user_id: Option<String>,
    default_host: Option<String>,
    default_path: Option<String>,
}
