//! Copy-on-write filesystem backend (ZFS/Btrfs) with native named
//! snapshots and atomic clone/promote.
//!
//! Grounded on the original's `ZFSOperations` (`src/dsg/backends.py`):
//! `_create_dataset`, `_create_snapshot`, and the atomic clone/promote
//! sequence sketched in that file's `Backend` TODO block
//! (`zfs clone dataset/repo@latest dataset/repo@sync-temp`, then
//! `zfs promote dataset/repo@sync-temp`). Commands are invoked the way the
//! teacher's `promotion::controller` drives external state: narrow, named
//! operations with explicit error reporting, never raw shell strings.

use std::path::PathBuf;
use std::process::Command;

use super::errors::{BackendError, BackendResult};
use super::SnapshotBackend;

/// Which copy-on-write filesystem backs this dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CowKind {
    /// ZFS: `zfs create`/`zfs snapshot`/`zfs clone`/`zfs promote`/`zfs rollback`.
    Zfs,
    /// Btrfs: `btrfs subvolume snapshot`, used for the `xfs`-labelled backend
    /// variant named in spec §6's config schema (XFS itself has no native
    /// snapshot primitive; the original ties `xfs` to hardlink emulation —
    /// see `HardlinkFs` — so this variant exists only for Btrfs datasets).
    Btrfs,
}

/// A ZFS- or Btrfs-backed snapshot filesystem.
pub struct SnapshotFs {
    kind: CowKind,
    dataset: String,
    mount_path: String,
}

impl SnapshotFs {
    /// Builds a backend targeting `dataset` (e.g. `tank/repos/myrepo`),
    /// mounted at `mount_path`.
    pub fn new(kind: CowKind, dataset: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self { kind, dataset: dataset.into(), mount_path: mount_path.into() }
    }

    fn run(&self, argv: &[&str]) -> BackendResult<()> {
        let output = Command::new(argv[0])
            .args(&argv[1..])
            .output()
            .map_err(|e| BackendError::io(format!("failed to launch {}", argv[0]), e))?;

        if !output.status.success() {
            return Err(BackendError::new(format!(
                "{} exited with {:?}: {}",
                argv.join(" "),
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    fn zfs_snapshot_name(&self, name: &str) -> String {
        format!("{}@{}", self.dataset, name)
    }
}

impl SnapshotBackend for SnapshotFs {
    fn create_dataset(&self) -> BackendResult<()> {
        match self.kind {
            CowKind::Zfs => {
                self.run(&["zfs", "create", &self.dataset])?;
                self.run(&[
                    "zfs",
                    "set",
                    &format!("mountpoint={}", self.mount_path),
                    &self.dataset,
                ])
            }
            CowKind::Btrfs => self.run(&["btrfs", "subvolume", "create", &self.mount_path]),
        }
    }

    fn destroy_dataset(&self) -> BackendResult<()> {
        match self.kind {
            CowKind::Zfs => self.run(&["zfs", "destroy", "-r", &self.dataset]),
            CowKind::Btrfs => self.run(&["btrfs", "subvolume", "delete", &self.mount_path]),
        }
    }

    fn clone_snapshot(&self, from_snapshot: Option<&str>, staging_name: &str) -> BackendResult<()> {
        match (self.kind, from_snapshot) {
            (CowKind::Zfs, Some(from)) => self.run(&[
                "zfs",
                "clone",
                &self.zfs_snapshot_name(from),
                &format!("{}-{}", self.dataset, staging_name),
            ]),
            // No snapshot exists yet (the repository's first sync): there
            // is nothing to clone from, so create the staging dataset
            // fresh, the same way `create_dataset` creates the live one.
            (CowKind::Zfs, None) => {
                let staging_dataset = format!("{}-{}", self.dataset, staging_name);
                self.run(&["zfs", "create", &staging_dataset])?;
                self.run(&[
                    "zfs",
                    "set",
                    &format!("mountpoint={}-{}", self.mount_path, staging_name),
                    &staging_dataset,
                ])
            }
            (CowKind::Btrfs, Some(from)) => self.run(&[
                "btrfs",
                "subvolume",
                "snapshot",
                &format!("{}/.snapshots/{}", self.mount_path, from),
                &format!("{}-{}", self.mount_path, staging_name),
            ]),
            (CowKind::Btrfs, None) => self.run(&[
                "btrfs",
                "subvolume",
                "create",
                &format!("{}-{}", self.mount_path, staging_name),
            ]),
        }
    }

    fn promote(&self, staging_name: &str) -> BackendResult<()> {
        match self.kind {
            CowKind::Zfs => self.run(&["zfs", "promote", &format!("{}-{}", self.dataset, staging_name)]),
            CowKind::Btrfs => self.run(&[
                "mv",
                &format!("{}-{}", self.mount_path, staging_name),
                &self.mount_path,
            ]),
        }
    }

    fn snapshot(&self, name: &str) -> BackendResult<()> {
        match self.kind {
            CowKind::Zfs => self.run(&["zfs", "snapshot", &self.zfs_snapshot_name(name)]),
            CowKind::Btrfs => self.run(&[
                "btrfs",
                "subvolume",
                "snapshot",
                "-r",
                &self.mount_path,
                &format!("{}/.snapshots/{}", self.mount_path, name),
            ]),
        }
    }

    fn rollback(&self, snapshot: &str) -> BackendResult<()> {
        match self.kind {
            CowKind::Zfs => self.run(&["zfs", "rollback", &self.zfs_snapshot_name(snapshot)]),
            CowKind::Btrfs => Err(BackendError::new(
                "btrfs rollback requires manual subvolume swap; not automated here",
            )),
        }
    }

    fn destroy_staging(&self, staging_name: &str) -> BackendResult<()> {
        match self.kind {
            CowKind::Zfs => self.run(&["zfs", "destroy", &format!("{}-{}", self.dataset, staging_name)]),
            CowKind::Btrfs => self.run(&["btrfs", "subvolume", "delete", &format!("{}-{}", self.mount_path, staging_name)]),
        }
    }

    fn list_snapshots(&self) -> BackendResult<Vec<String>> {
        match self.kind {
            CowKind::Zfs => {
                let output = Command::new("zfs")
                    .args(["list", "-t", "snapshot", "-o", "name", "-H"])
                    .arg("-r")
                    .arg(&self.dataset)
                    .output()
                    .map_err(|e| BackendError::io("failed to launch zfs list", e))?;

                if !output.status.success() {
                    return Err(BackendError::new("zfs list failed"));
                }

                let names = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .filter_map(|line| line.rsplit_once('@').map(|(_, snap)| snap.to_string()))
                    .collect();
                Ok(names)
            }
            CowKind::Btrfs => {
                let dir = format!("{}/.snapshots", self.mount_path);
                let mut names: Vec<String> = std::fs::read_dir(&dir)
                    .map_err(|e| BackendError::io(format!("failed to list {dir}"), e))?
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.file_name().into_string().ok())
                    .collect();
                names.sort();
                Ok(names)
            }
        }
    }

    fn live_root(&self) -> PathBuf {
        PathBuf::from(&self.mount_path)
    }

    fn staging_dir(&self, staging_name: &str) -> PathBuf {
        PathBuf::from(format!("{}-{}", self.mount_path, staging_name))
    }
}
