//! Orchestrates a full sync: precondition checks, normalization,
//! planning, staged commit, and cleanup, per spec §4.10.
//!
//! Grounded on the teacher's `promotion/state.rs` state machine (states
//! explicit and enumerable, transitions event-driven, all failures
//! explicit) and `recovery/startup.rs` (crash-recovery-on-boot repair of
//! a dangling commit).

pub mod errors;

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;

pub use errors::{TransactionError, TransactionResult};

use crate::backend::SnapshotBackend;
use crate::crash_point;
use crate::filename::Normalizer;
use crate::history::HistoryIndex;
use crate::manifest::{Manifest, ManifestMetadata};
use crate::merger::ManifestMerger;
use crate::observability::logger::{Logger, Severity};
use crate::planner::{SyncPlan, SyncPlanner, METADATA_FILES};
use crate::scanner::{self, IgnorePolicy, ScanOptions};
use crate::transport::{NullProgress, Transport};

const LAST_SYNC_FILE: &str = "last-sync.json";

/// The seven explicit phases a sync transaction passes through, in
/// order. Named after the teacher's `PromotionState` convention: states
/// are explicit and enumerable, transitions event-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fetch R, load C, scan L; verify chain continuity.
    Precondition,
    /// Run the normalizer and re-scan if residual warnings remain.
    Normalize,
    /// Classify states and build the action plan; abort on conflicts.
    Plan,
    /// Clone the latest remote snapshot and apply the plan to the clone.
    Stage,
    /// Recompute and verify the staged manifest's hashes and chain link.
    Verify,
    /// Promote the clone, cut a new snapshot, update history and cache.
    Commit,
    /// Destroy any leftover staging artifacts, release the lock.
    Cleanup,
}

impl Phase {
    /// The event name used in structured log lines for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Precondition => "precondition",
            Phase::Normalize => "normalize",
            Phase::Plan => "plan",
            Phase::Stage => "stage",
            Phase::Verify => "verify",
            Phase::Commit => "commit",
            Phase::Cleanup => "cleanup",
        }
    }
}

/// Everything a completed (or cleanly aborted) transaction reports back.
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    /// The snapshot id committed, if any commit occurred.
    pub snapshot_id: Option<String>,
    /// The plan that was executed (or would have been, if conflicts
    /// caused an abort before staging).
    pub plan: SyncPlan,
    /// `true` if a cooperative cancel was observed before commit and the
    /// sync was rolled back as a result.
    pub cancelled: bool,
}

/// Orchestrates one sync transaction against a single backend/transport
/// pair. One `Transaction` value corresponds to one invocation; it is not
/// reused across syncs.
pub struct Transaction<B: SnapshotBackend, T: Transport> {
    root: PathBuf,
    metadata_dir_name: String,
    user_id: String,
    backend: B,
    transport: T,
    planner: SyncPlanner,
    lock_file: Option<File>,
}

impl<B: SnapshotBackend, T: Transport> Transaction<B, T> {
    /// Builds a transaction rooted at the working tree `root`, talking to
    /// `backend`/`transport` for the remote side.
    pub fn new(
        root: impl Into<PathBuf>,
        metadata_dir_name: impl Into<String>,
        user_id: impl Into<String>,
        backend: B,
        transport: T,
        cache_only_strict: bool,
    ) -> Self {
        Self {
            root: root.into(),
            metadata_dir_name: metadata_dir_name.into(),
            user_id: user_id.into(),
            backend,
            transport,
            planner: SyncPlanner::new(cache_only_strict),
            lock_file: None,
        }
    }

    fn metadata_dir(&self) -> PathBuf {
        self.root.join(&self.metadata_dir_name)
    }

    fn lock_path(&self) -> PathBuf {
        self.metadata_dir().join(".lock")
    }

    fn remote_metadata_dir(&self) -> PathBuf {
        self.backend.live_root().join(&self.metadata_dir_name)
    }

    fn acquire_lock(&mut self) -> TransactionResult<()> {
        fs::create_dir_all(self.metadata_dir())
            .map_err(|e| TransactionError::io("failed to create metadata dir", e).in_phase(Phase::Precondition.as_str()))?;
        let file = File::create(self.lock_path())
            .map_err(|e| TransactionError::io("failed to open lock file", e).in_phase(Phase::Precondition.as_str()))?;
        file.try_lock_exclusive().map_err(|_| {
            TransactionError::new("another sync holds the metadata lock")
                .in_phase(Phase::Precondition.as_str())
        })?;
        let lock_path = self.lock_path().display().to_string();
        Logger::log(
            Severity::Info,
            "lock_acquired",
            &[("path", lock_path.as_str())],
        );
        self.lock_file = Some(file);
        Ok(())
    }

    fn release_lock(&mut self) {
        if let Some(file) = self.lock_file.take() {
            let _ = file.unlock();
            let lock_path = self.lock_path().display().to_string();
            Logger::log(
                Severity::Info,
                "lock_released",
                &[("path", lock_path.as_str())],
            );
        }
    }

    fn load_cache_manifest(&self) -> TransactionResult<Manifest> {
        let path = self.metadata_dir().join(LAST_SYNC_FILE);
        if !path.exists() {
            return Ok(Manifest::new());
        }
        Manifest::read_from_file(&path).map_err(|e| {
            TransactionError::new(e.to_string()).in_phase(Phase::Precondition.as_str())
        })
    }

    fn load_remote_manifest(&self) -> TransactionResult<Manifest> {
        let path = self.remote_metadata_dir().join(LAST_SYNC_FILE);
        if !path.exists() {
            return Ok(Manifest::new());
        }
        Manifest::read_from_file(&path).map_err(|e| {
            TransactionError::new(e.to_string()).in_phase(Phase::Precondition.as_str())
        })
    }

    fn check_chain_continuity(&self, c: &Manifest, r: &Manifest) -> TransactionResult<()> {
        let (Some(c_meta), Some(r_meta)) = (c.metadata(), r.metadata()) else {
            return Ok(());
        };
        if r_meta.snapshot_id == c_meta.snapshot_id {
            return Ok(());
        }
        if r_meta.previous_snapshot_id.as_deref() != Some(c_meta.snapshot_id.as_str()) {
            return Err(TransactionError::new(format!(
                "remote snapshot {} does not chain from last known snapshot {}",
                r_meta.snapshot_id, c_meta.snapshot_id
            ))
            .in_phase(Phase::Precondition.as_str()));
        }
        Ok(())
    }

    fn scan_local(&self, ignore: IgnorePolicy, data_dirs: Option<BTreeSet<String>>) -> TransactionResult<(Manifest, Vec<crate::filename::ValidationWarning>)> {
        let options = ScanOptions {
            root: self.root.clone(),
            ignore,
            metadata_dir_name: self.metadata_dir_name.clone(),
            include_metadata_dir: false,
            data_dirs,
            compute_hashes: true,
            user_id: self.user_id.clone(),
        };
        scanner::scan(&options).map_err(|e| {
            TransactionError::from(e).in_phase(Phase::Precondition.as_str())
        })
    }

    /// Runs a full sync transaction: precondition, normalize, plan,
    /// stage, verify, commit, cleanup. `cancel` is polled between files
    /// during Stage and Verify; a `true` result rolls the sync back.
    #[allow(clippy::too_many_arguments)]
    pub fn run(
        &mut self,
        ignore: IgnorePolicy,
        data_dirs: Option<BTreeSet<String>>,
        snapshot_message: &str,
        auto_normalize: bool,
        cancel: &dyn Fn() -> bool,
    ) -> TransactionResult<TransactionOutcome> {
        Logger::phase_start(Phase::Precondition.as_str());
        self.acquire_lock()?;
        let run_result = self.run_locked(ignore, data_dirs, snapshot_message, auto_normalize, cancel);
        self.release_lock();
        run_result
    }

    fn run_locked(
        &mut self,
        ignore: IgnorePolicy,
        data_dirs: Option<BTreeSet<String>>,
        snapshot_message: &str,
        auto_normalize: bool,
        cancel: &dyn Fn() -> bool,
    ) -> TransactionResult<TransactionOutcome> {
        let c_manifest = self.load_cache_manifest()?;
        let r_manifest = self.load_remote_manifest()?;
        self.check_chain_continuity(&c_manifest, &r_manifest)?;
        let (mut l_manifest, mut warnings) = self.scan_local(ignore.clone(), data_dirs.clone())?;
        Logger::phase_complete(Phase::Precondition.as_str());

        Logger::phase_start(Phase::Normalize.as_str());
        if auto_normalize && !warnings.is_empty() {
            let paths: Vec<String> = warnings.iter().map(|w| w.path.clone()).collect();
            let normalizer = Normalizer::new(&self.root);
            let report = normalizer.normalize_batch(&paths);
            if !report.errors.is_empty() {
                Logger::rollback(Phase::Normalize.as_str(), "normalization produced errors");
                return Err(TransactionError::new(format!(
                    "normalization failed for {} path(s)",
                    report.errors.len()
                ))
                .in_phase(Phase::Normalize.as_str()));
            }
            let rescan = self.scan_local(ignore.clone(), data_dirs.clone())?;
            l_manifest = rescan.0;
            warnings = rescan.1;
            if !warnings.is_empty() {
                return Err(TransactionError::new(format!(
                    "{} path(s) remain invalid after normalization",
                    warnings.len()
                ))
                .in_phase(Phase::Normalize.as_str()));
            }
        }
        Logger::phase_complete(Phase::Normalize.as_str());

        Logger::phase_start(Phase::Plan.as_str());
        let states = ManifestMerger::classify(&l_manifest, &c_manifest, &r_manifest);
        let plan = self.planner.plan(&states);
        if !plan.conflicts.is_empty() {
            Logger::phase_complete(Phase::Plan.as_str());
            return Err(TransactionError::new(format!(
                "{} path(s) in conflict",
                plan.conflicts.len()
            ))
            .in_phase(Phase::Plan.as_str()));
        }
        Logger::phase_complete(Phase::Plan.as_str());

        if plan.is_no_op() {
            return Ok(TransactionOutcome { snapshot_id: None, plan, cancelled: false });
        }

        Logger::phase_start(Phase::Stage.as_str());
        crash_point::maybe_crash(crash_point::points::STAGE_BEFORE_CLONE);
        let staging_name = format!("sync-{}", uuid::Uuid::new_v4());
        let latest = self.backend.list_snapshots()?.last().cloned();
        self.backend.clone_snapshot(latest.as_deref(), &staging_name)?;
        let staging_dir = self.backend.staging_dir(&staging_name);

        let stage_result = self.apply_plan(&plan, &staging_dir, cancel);
        if let Err(e) = stage_result {
            Logger::rollback(Phase::Stage.as_str(), &e.to_string());
            let _ = self.backend.destroy_staging(&staging_name);
            return Err(e);
        }
        if cancel() {
            Logger::rollback(Phase::Stage.as_str(), "cancelled");
            let _ = self.backend.destroy_staging(&staging_name);
            return Ok(TransactionOutcome { snapshot_id: None, plan, cancelled: true });
        }
        crash_point::maybe_crash(crash_point::points::STAGE_AFTER_APPLY);
        Logger::phase_complete(Phase::Stage.as_str());

        // apply_plan already wrote downloads and local deletions straight
        // to `self.root`, so `l_manifest` (scanned during Precondition) no
        // longer reflects L. Rescan so Verify and Commit work from the true
        // post-sync tree rather than a stale snapshot of it.
        let synced_manifest = match self.scan_local(ignore, data_dirs) {
            Ok((manifest, _warnings)) => manifest,
            Err(e) => {
                Logger::rollback(Phase::Verify.as_str(), &e.to_string());
                let _ = self.backend.destroy_staging(&staging_name);
                return Err(e);
            }
        };

        Logger::phase_start(Phase::Verify.as_str());
        let verify_result = self.verify_staged(&staging_dir, &r_manifest, &synced_manifest, snapshot_message);
        let new_metadata = match verify_result {
            Ok(metadata) => metadata,
            Err(e) => {
                Logger::rollback(Phase::Verify.as_str(), &e.to_string());
                let _ = self.backend.destroy_staging(&staging_name);
                return Err(e);
            }
        };
        if cancel() {
            Logger::rollback(Phase::Verify.as_str(), "cancelled");
            let _ = self.backend.destroy_staging(&staging_name);
            return Ok(TransactionOutcome { snapshot_id: None, plan, cancelled: true });
        }
        crash_point::maybe_crash(crash_point::points::VERIFY_AFTER_CHECK);
        Logger::phase_complete(Phase::Verify.as_str());

        Logger::phase_start(Phase::Commit.as_str());

        let mut new_manifest = Manifest::new();
        for (_path, entry) in synced_manifest.iter() {
            new_manifest.insert(entry.clone());
        }
        new_manifest.set_metadata(new_metadata.clone());

        // Write the new manifest and history into the staging clone's own
        // metadata dir before promoting it, so the remote carries this
        // commit's metadata the moment it becomes live — matching
        // `repair_dangling_commit`'s assumption that a crash between
        // promote and the local cache rewrite still leaves a recoverable
        // metadata record on the remote.
        let staging_metadata_dir = staging_dir.join(&self.metadata_dir_name);
        fs::create_dir_all(&staging_metadata_dir)
            .map_err(|e| TransactionError::io("failed to create staging metadata dir", e).in_phase(Phase::Commit.as_str()))?;
        new_manifest
            .write_to_file(&staging_metadata_dir.join(LAST_SYNC_FILE))
            .map_err(|e| TransactionError::new(e.to_string()).in_phase(Phase::Commit.as_str()))?;
        let mut remote_history = HistoryIndex::read_from_dir(&staging_metadata_dir).unwrap_or_default();
        remote_history.append_snapshot(new_metadata.clone())?;
        remote_history.write_to_dir(&staging_metadata_dir)?;

        self.backend.promote(&staging_name)?;
        crash_point::maybe_crash(crash_point::points::COMMIT_AFTER_PROMOTE);
        self.backend.snapshot(&new_metadata.snapshot_id)?;
        crash_point::maybe_crash(crash_point::points::COMMIT_AFTER_SNAPSHOT);

        new_manifest
            .write_to_file(&self.metadata_dir().join(LAST_SYNC_FILE))
            .map_err(|e| TransactionError::new(e.to_string()).in_phase(Phase::Commit.as_str()))?;

        let mut history = HistoryIndex::read_from_dir(&self.metadata_dir()).unwrap_or_default();
        history.append_snapshot(new_metadata.clone())?;
        history.write_to_dir(&self.metadata_dir())?;
        crash_point::maybe_crash(crash_point::points::COMMIT_AFTER_HISTORY);
        Logger::phase_complete(Phase::Commit.as_str());

        Logger::phase_start(Phase::Cleanup.as_str());
        crash_point::maybe_crash(crash_point::points::CLEANUP_BEFORE_DESTROY);
        let _ = self.backend.destroy_staging(&staging_name);
        Logger::phase_complete(Phase::Cleanup.as_str());

        Ok(TransactionOutcome { snapshot_id: Some(new_metadata.snapshot_id), plan, cancelled: false })
    }

    fn apply_plan(&self, plan: &SyncPlan, staging_dir: &Path, cancel: &dyn Fn() -> bool) -> TransactionResult<()> {
        let mut progress = NullProgress;

        // The engine's own metadata files (forced into `upload_files` by
        // the planner so `is_no_op` accounting and disjointness hold) live
        // under `metadata_dir()`, not the working-tree root, and their
        // final content isn't known until Commit computes the new
        // manifest. They're written straight into the staging metadata
        // dir there, before promote, rather than copied here.
        let uploads: Vec<String> = plan
            .upload_files
            .iter()
            .filter(|f| !METADATA_FILES.contains(&f.as_str()))
            .cloned()
            .collect();
        self.transport.copy_files(&uploads, &self.root, staging_dir, &mut progress)?;

        let downloads: Vec<String> = plan.download_files.iter().cloned().collect();
        self.transport.copy_files(&downloads, staging_dir, &self.root, &mut progress)?;

        for path in &plan.delete_local {
            if cancel() {
                return Ok(());
            }
            let full = self.root.join(path);
            if full.exists() {
                fs::remove_file(&full)
                    .map_err(|e| TransactionError::io(format!("failed to delete {}", full.display()), e))?;
            }
        }

        for path in &plan.delete_remote {
            if cancel() {
                return Ok(());
            }
            let full = staging_dir.join(path);
            if full.exists() {
                fs::remove_file(&full)
                    .map_err(|e| TransactionError::io(format!("failed to delete {}", full.display()), e))?;
            }
        }

        Ok(())
    }

    fn verify_staged(
        &self,
        staging_dir: &Path,
        r_manifest: &Manifest,
        l_manifest: &Manifest,
        snapshot_message: &str,
    ) -> TransactionResult<ManifestMetadata> {
        let entries_hash = l_manifest
            .entries_hash()
            .map_err(|e| TransactionError::new(e.to_string()))?;

        let next_id = self.backend.next_snapshot_id()?;
        let previous_snapshot_id = r_manifest.metadata().map(|m| m.snapshot_id.clone());
        let previous_snapshot_hash = r_manifest.metadata().map(|m| m.snapshot_hash.clone());

        let metadata = ManifestMetadata::new(
            next_id,
            chrono::Utc::now().to_rfc3339(),
            self.user_id.clone(),
            l_manifest.len(),
            entries_hash,
            snapshot_message,
            previous_snapshot_id,
            previous_snapshot_hash.as_deref(),
        );

        metadata
            .verify_chain_link(previous_snapshot_hash.as_deref())
            .map_err(|e| TransactionError::new(e.to_string()))?;

        let _ = staging_dir;
        Ok(metadata)
    }

    /// Repairs a missing `HistoryIndex` record after an interrupted
    /// commit: if the backend's latest snapshot has no corresponding
    /// entry in the local history, reads the snapshot's own metadata
    /// file (already durable on the remote) and appends it idempotently.
    ///
    /// Grounded on the teacher's `recovery/startup.rs`
    /// crash-recovery-on-boot pass.
    pub fn repair_dangling_commit(&self) -> TransactionResult<Option<String>> {
        let latest = match self.backend.list_snapshots()?.last().cloned() {
            Some(id) => id,
            None => return Ok(None),
        };

        let mut history = HistoryIndex::read_from_dir(&self.metadata_dir()).unwrap_or_default();
        if history.get(&latest).is_some() {
            return Ok(None);
        }

        let remote_manifest = self.load_remote_manifest()?;
        let metadata = match remote_manifest.metadata() {
            Some(m) if m.snapshot_id == latest => m.clone(),
            _ => {
                return Err(TransactionError::new(format!(
                    "dangling commit {latest} has no recoverable metadata record"
                )))
            }
        };

        history.append_snapshot(metadata.clone())?;
        history.write_to_dir(&self.metadata_dir())?;
        remote_manifest
            .write_to_file(&self.metadata_dir().join(LAST_SYNC_FILE))
            .map_err(|e| TransactionError::new(e.to_string()))?;

        Logger::log(
            Severity::Warn,
            "dangling_commit_repaired",
            &[("snapshot_id", latest.as_str())],
        );

        Ok(Some(latest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HardlinkFs;
    use crate::transport::LocalTransport;
    use tempfile::TempDir;

    fn ignore_policy() -> IgnorePolicy {
        IgnorePolicy { names: Default::default(), suffixes: Default::default(), paths: Default::default() }
    }

    #[test]
    fn phase_names_are_lowercase() {
        for phase in [
            Phase::Precondition,
            Phase::Normalize,
            Phase::Plan,
            Phase::Stage,
            Phase::Verify,
            Phase::Commit,
            Phase::Cleanup,
        ] {
            assert!(phase.as_str().chars().all(|c| c.is_lowercase() || c == '_'));
        }
    }

    #[test]
    fn init_sync_commits_genesis_snapshot() {
        let work = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        fs::write(work.path().join("data.csv"), b"id,v\n1,10\n").unwrap();

        let backend = HardlinkFs::new(remote.path());
        backend.create_dataset().unwrap();

        let mut txn = Transaction::new(
            work.path(),
            ".dsg",
            "alice@example.org",
            backend,
            LocalTransport::new(),
            false,
        );

        let outcome = txn
            .run(ignore_policy(), None, "genesis", false, &|| false)
            .unwrap();

        assert_eq!(outcome.snapshot_id.as_deref(), Some("s1"));
        assert!(!outcome.cancelled);
        assert!(work.path().join(".dsg/last-sync.json").exists());
    }

    #[test]
    fn no_op_sync_does_not_create_a_snapshot() {
        let work = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();

        let backend = HardlinkFs::new(remote.path());
        backend.create_dataset().unwrap();

        let mut txn = Transaction::new(
            work.path(),
            ".dsg",
            "alice@example.org",
            backend,
            LocalTransport::new(),
            false,
        );

        let outcome = txn
            .run(ignore_policy(), None, "nothing to do", false, &|| false)
            .unwrap();

        assert!(outcome.snapshot_id.is_none());
    }

    #[test]
    fn lock_is_released_after_a_completed_run() {
        let work = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        fs::write(work.path().join("data.csv"), b"id,v\n1,10\n").unwrap();

        let backend = HardlinkFs::new(remote.path());
        backend.create_dataset().unwrap();

        let mut txn = Transaction::new(
            work.path(),
            ".dsg",
            "alice@example.org",
            backend,
            LocalTransport::new(),
            false,
        );
        txn.run(ignore_policy(), None, "genesis", false, &|| false).unwrap();

        let lock_file = File::create(txn.lock_path()).unwrap();
        assert!(lock_file.try_lock_exclusive().is_ok());
    }

    #[test]
    fn repair_dangling_commit_is_a_no_op_when_history_is_consistent() {
        let work = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        fs::write(work.path().join("data.csv"), b"id,v\n1,10\n").unwrap();

        let backend = HardlinkFs::new(remote.path());
        backend.create_dataset().unwrap();

        let mut txn = Transaction::new(
            work.path(),
            ".dsg",
            "alice@example.org",
            backend,
            LocalTransport::new(),
            false,
        );
        txn.run(ignore_policy(), None, "genesis", false, &|| false).unwrap();

        assert_eq!(txn.repair_dangling_commit().unwrap(), None);
    }

    #[test]
    fn a_completed_sync_writes_metadata_to_the_remote_too() {
        let work = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        fs::write(work.path().join("data.csv"), b"id,v\n1,10\n").unwrap();

        let backend = HardlinkFs::new(remote.path());
        backend.create_dataset().unwrap();

        let mut txn = Transaction::new(
            work.path(),
            ".dsg",
            "alice@example.org",
            backend,
            LocalTransport::new(),
            false,
        );
        txn.run(ignore_policy(), None, "genesis", false, &|| false).unwrap();

        assert!(remote.path().join(".dsg/last-sync.json").exists());
    }

    #[test]
    fn a_download_is_reflected_in_the_new_cache_manifest() {
        let first_work = TempDir::new().unwrap();
        let remote = TempDir::new().unwrap();
        fs::write(first_work.path().join("data.csv"), b"id,v\n1,10\n").unwrap();

        let backend = HardlinkFs::new(remote.path());
        backend.create_dataset().unwrap();
        let mut first = Transaction::new(
            first_work.path(),
            ".dsg",
            "alice@example.org",
            backend,
            LocalTransport::new(),
            false,
        );
        first.run(ignore_policy(), None, "genesis", false, &|| false).unwrap();

        // A second working tree, with no cache of its own, pulls the file
        // that's only present on the remote.
        let second_work = TempDir::new().unwrap();
        let mut second = Transaction::new(
            second_work.path(),
            ".dsg",
            "bob@example.org",
            HardlinkFs::new(remote.path()),
            LocalTransport::new(),
            false,
        );
        let outcome = second
            .run(ignore_policy(), None, "pull", false, &|| false)
            .unwrap();

        assert_eq!(outcome.snapshot_id.as_deref(), Some("s2"));
        assert!(second_work.path().join("data.csv").exists());

        let cache = Manifest::read_from_file(&second_work.path().join(".dsg/last-sync.json")).unwrap();
        assert!(cache.iter().any(|(p, _)| p == "data.csv"));
    }
}
