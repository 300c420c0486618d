//! Aggregate error type for the engine.
//!
//! Per spec §7, seven error kinds govern propagation policy: `ConfigError`,
//! `AccessError`, `ValidationError`, `ConflictError`, `IntegrityError`,
//! `TransactionError`, `CancelledError`. Each leaf module defines its own
//! narrow error type; `DsgError` aggregates them at the crate boundary.

use thiserror::Error;

use crate::merger::SyncState;

/// Top-level error type returned by engine operations.
#[derive(Debug, Error)]
pub enum DsgError {
    /// Missing or malformed `.dsgconfig.yml`, invalid user config, unrecognized transport.
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Cannot reach backend, missing credentials, insufficient privileges.
    #[error("access error: {0}")]
    Access(#[from] crate::transport::TransportError),

    /// Residual invalid paths after normalization, path escaping repository root.
    #[error("validation error: {0}")]
    Validation(#[from] crate::filename::ValidationError),

    /// One or more entries are in a conflict state; carries the full list.
    #[error("conflict on {n} path(s)", n = .0.len())]
    Conflict(Vec<(String, SyncState)>),

    /// Manifest hash mismatch, chain discontinuity, stored hash disagrees with recomputation.
    #[error("integrity error: {0}")]
    Integrity(#[from] crate::manifest::IntegrityError),

    /// Staging, verify, or commit step failed; triggers rollback.
    #[error("transaction error: {0}")]
    Transaction(#[from] crate::transaction::TransactionError),

    /// Cooperative cancellation observed before commit.
    #[error("sync cancelled")]
    Cancelled,

    /// Underlying filesystem I/O failure not otherwise classified.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the engine.
pub type DsgResult<T> = Result<T, DsgError>;
