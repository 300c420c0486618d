//! Project- and user-level configuration, per spec §6.

pub mod errors;
pub mod project;
pub mod user;

pub use errors::{ConfigError, ConfigResult};
pub use project::{IgnoreConfig, ProjectConfig, Repository, RepositoryKind, SshConfig};
pub use user::UserConfig;
