//! Coarse progress events, delivered synchronously via a callback.
//!
//! Per spec §5: the callback receives `start_metadata`,
//! `complete_metadata`, `start_files(total_files, total_bytes)`,
//! `update_files(delta)`, `complete_files`, `no_files`. It must be
//! re-entrant with respect to itself; the engine never calls it from
//! multiple threads. Grounded on the original's `ProgressCallback` wiring
//! in `src/dsg/cli.py` (`start_metadata_sync`, `complete_metadata_sync`,
//! `start_files_sync`, `update_files_progress`, `complete_files_sync`,
//! `report_no_files`).

/// A single progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Metadata (manifest) exchange has started.
    StartMetadata,
    /// Metadata exchange has completed.
    CompleteMetadata,
    /// Bulk file transfer has started, with totals known up front.
    StartFiles { total_files: usize, total_bytes: u64 },
    /// A delta of files has completed within the bulk transfer.
    UpdateFiles { delta: usize },
    /// Bulk file transfer has completed.
    CompleteFiles,
    /// There was nothing to transfer.
    NoFiles,
}

/// A progress callback. Boxed so callers can close over arbitrary state
/// (e.g. a terminal progress bar) without generic propagation through
/// every transport/backend signature.
pub trait ProgressCallback {
    /// Receives one progress event.
    fn on_event(&mut self, event: ProgressEvent);
}

/// A no-op callback used when the caller does not want progress reporting.
#[derive(Default)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_event(&mut self, _event: ProgressEvent) {}
}
