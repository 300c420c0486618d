//! Move bytes between the working copy and the backend.
//!
//! Per spec §4.7: a minimal interface — `copy_files` and `run_command` —
//! that must not interpret the file list; the engine decides what is
//! synced. Two concrete variants: `LocalTransport` (same host) and
//! `RemoteStreamTransport` (secure shell + streaming file copier).

pub mod errors;
pub mod local;
pub mod progress;
pub mod remote;

pub use errors::{TransportError, TransportResult};
pub use local::LocalTransport;
pub use progress::{NullProgress, ProgressCallback, ProgressEvent};
pub use remote::RemoteStreamTransport;

use std::path::Path;

/// Abstraction over "move bytes and run commands at the remote side".
pub trait Transport {
    /// Copies every path in `file_list` from `src_base` to `dst_base`,
    /// preserving mtimes and symlink semantics. Reports progress via
    /// `progress`.
    fn copy_files(
        &self,
        file_list: &[String],
        src_base: &Path,
        dst_base: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> TransportResult<()>;

    /// Runs a command, returning `(exit_code, stdout, stderr)`.
    fn run_command(&self, argv: &[String]) -> TransportResult<(i32, String, String)>;
}
