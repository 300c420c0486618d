//! Filesystem without native snapshots; emulates them via hardlink trees.
//!
//! `materialize_snapshot` hardlink-copies the live tree into a snapshot
//! directory (`<root>/s<N>/`), matching spec §4.8 and the original's
//! coarser-atomicity fallback path for XFS/local backends
//! (`src/dsg/backends.py`'s `XFSOperations`).

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{BackendError, BackendResult};
use super::SnapshotBackend;

/// A hardlink-emulated snapshot filesystem rooted at `root`. The live tree
/// lives directly under `root`; each snapshot is a hardlink copy under
/// `root/.snapshots/sN/`.
pub struct HardlinkFs {
    root: PathBuf,
}

impl HardlinkFs {
    /// Builds a backend rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn snapshots_dir(&self) -> PathBuf {
        self.root.join(".snapshots")
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.snapshots_dir().join(name)
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        self.root.join(format!(".staging-{name}"))
    }

    /// Hardlink-copies every regular file from `src` into `dst`,
    /// recreating directory structure and symlinks as real entries
    /// (hardlinks apply only to regular file data).
    fn hardlink_tree(src: &Path, dst: &Path) -> BackendResult<()> {
        fs::create_dir_all(dst)
            .map_err(|e| BackendError::io(format!("failed to create {}", dst.display()), e))?;

        let entries = fs::read_dir(src)
            .map_err(|e| BackendError::io(format!("failed to read {}", src.display()), e))?;

        for entry in entries {
            let entry = entry.map_err(|e| BackendError::io("failed to read dir entry", e))?;
            let src_path = entry.path();
            let dst_path = dst.join(entry.file_name());
            let meta = fs::symlink_metadata(&src_path)
                .map_err(|e| BackendError::io(format!("failed to stat {}", src_path.display()), e))?;

            if meta.file_type().is_dir() {
                Self::hardlink_tree(&src_path, &dst_path)?;
            } else if meta.file_type().is_symlink() {
                let target = fs::read_link(&src_path)
                    .map_err(|e| BackendError::io(format!("failed to read link {}", src_path.display()), e))?;
                #[cfg(unix)]
                std::os::unix::fs::symlink(&target, &dst_path)
                    .map_err(|e| BackendError::io(format!("failed to link {}", dst_path.display()), e))?;
            } else {
                fs::hard_link(&src_path, &dst_path)
                    .map_err(|e| BackendError::io(format!("failed to hardlink {}", dst_path.display()), e))?;
            }
        }

        Ok(())
    }
}

impl SnapshotBackend for HardlinkFs {
    fn create_dataset(&self) -> BackendResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| BackendError::io(format!("failed to create {}", self.root.display()), e))?;
        fs::create_dir_all(self.snapshots_dir())
            .map_err(|e| BackendError::io("failed to create .snapshots", e))
    }

    fn destroy_dataset(&self) -> BackendResult<()> {
        fs::remove_dir_all(&self.root)
            .map_err(|e| BackendError::io(format!("failed to remove {}", self.root.display()), e))
    }

    fn clone_snapshot(&self, _from_snapshot: Option<&str>, staging_name: &str) -> BackendResult<()> {
        Self::hardlink_tree(&self.root, &self.staging_path(staging_name))
    }

    fn promote(&self, staging_name: &str) -> BackendResult<()> {
        let staging = self.staging_path(staging_name);
        for entry in fs::read_dir(&self.root)
            .map_err(|e| BackendError::io("failed to read root during promote", e))?
        {
            let entry = entry.map_err(|e| BackendError::io("failed to read dir entry", e))?;
            if entry.file_name() == ".snapshots" || entry.file_name().to_string_lossy().starts_with(".staging-") {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            }
            .map_err(|e| BackendError::io(format!("failed to remove {}", path.display()), e))?;
        }

        for entry in fs::read_dir(&staging)
            .map_err(|e| BackendError::io("failed to read staging during promote", e))?
        {
            let entry = entry.map_err(|e| BackendError::io("failed to read staging entry", e))?;
            let dst = self.root.join(entry.file_name());
            fs::rename(entry.path(), &dst)
                .map_err(|e| BackendError::io(format!("failed to move {}", dst.display()), e))?;
        }

        fs::remove_dir_all(&staging)
            .map_err(|e| BackendError::io("failed to remove staging dir", e))
    }

    fn snapshot(&self, name: &str) -> BackendResult<()> {
        Self::hardlink_tree(&self.root, &self.snapshot_path(name))
    }

    fn rollback(&self, snapshot: &str) -> BackendResult<()> {
        let snapshot_path = self.snapshot_path(snapshot);
        if !snapshot_path.exists() {
            return Err(BackendError::new(format!("snapshot {snapshot} does not exist")));
        }
        self.promote_from(&snapshot_path)
    }

    fn destroy_staging(&self, staging_name: &str) -> BackendResult<()> {
        let staging = self.staging_path(staging_name);
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .map_err(|e| BackendError::io("failed to remove staging dir", e))?;
        }
        Ok(())
    }

    fn list_snapshots(&self) -> BackendResult<Vec<String>> {
        let dir = self.snapshots_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&dir)
            .map_err(|e| BackendError::io(format!("failed to read {}", dir.display()), e))?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }

    fn live_root(&self) -> PathBuf {
        self.root.clone()
    }

    fn staging_dir(&self, staging_name: &str) -> PathBuf {
        self.staging_path(staging_name)
    }
}

impl HardlinkFs {
    fn promote_from(&self, snapshot_path: &Path) -> BackendResult<()> {
        for entry in fs::read_dir(&self.root)
            .map_err(|e| BackendError::io("failed to read root during rollback", e))?
        {
            let entry = entry.map_err(|e| BackendError::io("failed to read dir entry", e))?;
            if entry.file_name() == ".snapshots" || entry.file_name().to_string_lossy().starts_with(".staging-") {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            }
            .map_err(|e| BackendError::io(format!("failed to remove {}", path.display()), e))?;
        }
        Self::hardlink_tree(snapshot_path, &self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn snapshot_and_list_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = HardlinkFs::new(dir.path());
        backend.create_dataset().unwrap();
        fs::write(dir.path().join("a.csv"), b"data").unwrap();

        backend.snapshot("s1").unwrap();
        assert_eq!(backend.list_snapshots().unwrap(), vec!["s1".to_string()]);
        assert!(dir.path().join(".snapshots/s1/a.csv").exists());
    }

    #[test]
    fn next_snapshot_id_follows_strict_order() {
        let dir = TempDir::new().unwrap();
        let backend = HardlinkFs::new(dir.path());
        backend.create_dataset().unwrap();
        backend.snapshot("s1").unwrap();
        backend.snapshot("s2").unwrap();
        assert_eq!(backend.next_snapshot_id().unwrap(), "s3");
    }

    #[test]
    fn clone_stage_promote_cycle() {
        let dir = TempDir::new().unwrap();
        let backend = HardlinkFs::new(dir.path());
        backend.create_dataset().unwrap();
        fs::write(dir.path().join("a.csv"), b"v1").unwrap();
        backend.snapshot("s1").unwrap();

        backend.clone_snapshot(Some("s1"), "sync-temp").unwrap();
        fs::write(dir.path().join(".staging-sync-temp/a.csv"), b"v2").unwrap();
        backend.promote("sync-temp").unwrap();

        assert_eq!(fs::read(dir.path().join("a.csv")).unwrap(), b"v2");
    }

    #[test]
    fn rollback_restores_snapshot_contents() {
        let dir = TempDir::new().unwrap();
        let backend = HardlinkFs::new(dir.path());
        backend.create_dataset().unwrap();
        fs::write(dir.path().join("a.csv"), b"v1").unwrap();
        backend.snapshot("s1").unwrap();

        fs::write(dir.path().join("a.csv"), b"corrupted").unwrap();
        backend.rollback("s1").unwrap();

        assert_eq!(fs::read(dir.path().join("a.csv")).unwrap(), b"v1");
    }
}
