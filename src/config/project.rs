//! Project-level configuration: `.dsgconfig.yml`.
//!
//! Recognized options per spec §6: `name`, `transport`, `ssh`,
//! `repository`, `data_dirs`, `ignore`.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};

/// Filesystem kind backing an `ssh` transport (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SshFsKind {
    /// Remote ZFS dataset.
    Zfs,
    /// Remote XFS (hardlink-emulated snapshots).
    Xfs,
    /// Plain local path on the remote host (no snapshot primitive).
    Local,
}

/// `ssh:` block, present when `transport = ssh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfig {
    /// Remote host, e.g. `user@storage.example.org`.
    pub host: String,
    /// Remote base path.
    pub path: String,
    /// Optional repository name override; defaults to the project name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Which filesystem backs the remote dataset.
    #[serde(rename = "type")]
    pub fs_type: SshFsKind,
}

/// The kind of repository named by a `repository:` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    /// Local filesystem, no network transport.
    Local,
    /// SSH to a remote host.
    Ssh,
    /// `rclone`-managed remote.
    Rclone,
    /// IPFS-addressed remote.
    Ipfs,
}

/// The richer `repository:` variant (spec §6), naming a repository type
/// and its backend-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Which kind of repository this is.
    #[serde(rename = "type")]
    pub kind: RepositoryKind,
    /// ZFS pool name, when `kind == Ssh` and the remote uses ZFS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zfs_pool: Option<String>,
    /// IPFS DID, when `kind == Ipfs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipfs_did: Option<String>,
    /// `rclone` remote name, when `kind == Rclone`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rclone_remote: Option<String>,
}

/// Ignore rules: exact names, path suffixes, and exact relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Component names to ignore wherever they occur.
    #[serde(default)]
    pub names: BTreeSet<String>,
    /// Path suffixes to ignore.
    #[serde(default)]
    pub suffixes: BTreeSet<String>,
    /// Exact relative paths to ignore.
    #[serde(default)]
    pub paths: BTreeSet<String>,
}

impl From<IgnoreConfig> for crate::scanner::IgnorePolicy {
    fn from(cfg: IgnoreConfig) -> Self {
        crate::scanner::IgnorePolicy {
            names: cfg.names,
            suffixes: cfg.suffixes,
            paths: cfg.paths,
        }
    }
}

/// Recognized transports (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Same-host transport.
    Local,
    /// Secure shell transport.
    Ssh,
    /// `rclone`-managed transport.
    Rclone,
    /// IPFS transport.
    Ipfs,
}

/// Project-level configuration, committed by users as `.dsgconfig.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name; must be non-empty.
    pub name: String,
    /// Which transport to use.
    pub transport: TransportKind,
    /// SSH connection parameters; required when `transport == Ssh`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshConfig>,
    /// Richer repository descriptor, an alternative to `ssh`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    /// Candidate top-level directories for syncing.
    #[serde(default)]
    pub data_dirs: BTreeSet<String>,
    /// Ignore rules.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

impl ProjectConfig {
    /// Parses and validates a `.dsgconfig.yml` document.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: ProjectConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::new(format!("failed to parse .dsgconfig.yml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates `.dsgconfig.yml` from `path`.
    pub fn read_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("failed to read {}: {e}", path.display())))?;
        Self::from_yaml(&content)
    }

    /// Validates the config per spec §6's recognized-options contract.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::new("project name must be non-empty"));
        }
        if self.transport == TransportKind::Ssh && self.ssh.is_none() {
            return Err(ConfigError::new("transport \"ssh\" requires an ssh: block"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_local_config() {
        let yaml = "name: myproject\ntransport: local\n";
        let config = ProjectConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "myproject");
        assert_eq!(config.transport, TransportKind::Local);
    }

    #[test]
    fn ssh_transport_requires_ssh_block() {
        let yaml = "name: myproject\ntransport: ssh\n";
        assert!(ProjectConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn parses_full_ssh_config() {
        let yaml = r#"
name: myproject
transport: ssh
ssh:
  host: storage.example.org
  path: /var/repos/myproject
  type: zfs
data_dirs:
  - input
  - output
ignore:
  names:
    - .git
  suffixes:
    - .pyc
  paths:
    - scratch/tmp.csv
"#;
        let config = ProjectConfig::from_yaml(yaml).unwrap();
        let ssh = config.ssh.unwrap();
        assert_eq!(ssh.host, "storage.example.org");
        assert_eq!(ssh.fs_type, SshFsKind::Zfs);
        assert!(config.data_dirs.contains("input"));
        assert!(config.ignore.names.contains(".git"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let yaml = "name: \"\"\ntransport: local\n";
        assert!(ProjectConfig::from_yaml(yaml).is_err());
    }
}
