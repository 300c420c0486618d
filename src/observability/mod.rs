//! Structured logging for the sync engine.

pub mod logger;

pub use logger::{Logger, Severity};
