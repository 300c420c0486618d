//! dsg-core: three-way manifest reconciliation and sync orchestration
//! for snapshot-backed data repositories.
//!
//! The engine reconciles a working copy (L), a local cache of the last
//! agreed state (C), and a remote manifest (R) into one of 15
//! [`merger::SyncState`] classifications per path, turns that into a
//! [`planner::SyncPlan`], and executes the plan as a single
//! [`transaction::Transaction`] against a [`backend::SnapshotBackend`]
//! reached through a [`transport::Transport`].

pub mod backend;
pub mod config;
pub mod crash_point;
pub mod error;
pub mod filename;
pub mod hasher;
pub mod history;
pub mod manifest;
pub mod merger;
pub mod observability;
pub mod planner;
pub mod scanner;
pub mod transaction;
pub mod transport;

pub use error::{DsgError, DsgResult};
