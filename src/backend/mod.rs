//! Filesystem-specific primitives: create dataset, create named snapshot,
//! atomic clone/promote, rollback. Spec §4.8.
//!
//! Two concrete variants: `SnapshotFs` (copy-on-write filesystem with
//! native named snapshots and atomic clone/promote — ZFS or Btrfs) and
//! `HardlinkFs` (no snapshot primitive; emulates snapshots via hardlink
//! trees). Snapshots in both variants are named `s1`, `s2`, ... in strict
//! ascending order.

pub mod errors;
pub mod hardlinkfs;
pub mod snapshotfs;

use std::path::PathBuf;

pub use errors::{BackendError, BackendResult};
pub use hardlinkfs::HardlinkFs;
pub use snapshotfs::SnapshotFs;

/// Abstracts the remote's filesystem primitives behind a narrow interface
/// (spec §9: "treat ZFS/XFS/hardlink-based backends as interchangeable").
pub trait SnapshotBackend {
    /// Creates the dataset/root directory backing this repository.
    fn create_dataset(&self) -> BackendResult<()>;

    /// Destroys the dataset/root directory. Administrative; not used by a
    /// normal sync transaction.
    fn destroy_dataset(&self) -> BackendResult<()>;

    /// Creates a temporary clone (or equivalent staging copy) of the named
    /// snapshot, returning a handle used for staged edits.
    fn clone_snapshot(&self, from_snapshot: Option<&str>, staging_name: &str) -> BackendResult<()>;

    /// Atomically promotes the staging clone to become the live dataset.
    fn promote(&self, staging_name: &str) -> BackendResult<()>;

    /// Creates a named, immutable snapshot of the current live dataset.
    fn snapshot(&self, name: &str) -> BackendResult<()>;

    /// Rolls back the live dataset to a previously created snapshot.
    fn rollback(&self, snapshot: &str) -> BackendResult<()>;

    /// Destroys a staging clone without promoting it (rollback path).
    fn destroy_staging(&self, staging_name: &str) -> BackendResult<()>;

    /// Lists snapshot names in ascending creation order.
    fn list_snapshots(&self) -> BackendResult<Vec<String>>;

    /// Returns the on-disk path of the live dataset, usable by a
    /// `Transport` for direct file copies.
    fn live_root(&self) -> PathBuf;

    /// Returns the on-disk path a staging clone materializes at, usable
    /// by a `Transport` for direct file copies into/out of the clone.
    fn staging_dir(&self, staging_name: &str) -> PathBuf;

    /// Returns the next snapshot id in the `sN` sequence.
    fn next_snapshot_id(&self) -> BackendResult<String> {
        let existing = self.list_snapshots()?;
        let max = existing
            .iter()
            .filter_map(|s| s.strip_prefix('s'))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Ok(format!("s{}", max + 1))
    }
}
