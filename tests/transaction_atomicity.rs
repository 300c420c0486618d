//! Exercises `Transaction::run` end to end against a real filesystem,
//! asserting the all-or-nothing behavior spec'd for Stage/Verify/Commit:
//! a cancelled run leaves the remote's snapshot history untouched, and a
//! completed run advances it by exactly one snapshot.

use std::fs;

use dsg_core::backend::{HardlinkFs, SnapshotBackend};
use dsg_core::scanner::IgnorePolicy;
use dsg_core::transaction::Transaction;
use dsg_core::transport::LocalTransport;
use tempfile::TempDir;

fn new_txn(work: &TempDir, remote: &TempDir) -> Transaction<HardlinkFs, LocalTransport> {
    let backend = HardlinkFs::new(remote.path());
    backend.create_dataset().unwrap();
    Transaction::new(work.path(), ".dsg", "alice@example.org", backend, LocalTransport::new(), false)
}

#[test]
fn a_completed_sync_advances_the_remote_by_one_snapshot() {
    let work = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    fs::write(work.path().join("readings.csv"), b"id,v\n1,10\n").unwrap();

    let mut txn = new_txn(&work, &remote);
    let outcome = txn.run(IgnorePolicy::default(), None, "genesis", false, &|| false).unwrap();

    assert_eq!(outcome.snapshot_id.as_deref(), Some("s1"));
    assert!(!outcome.cancelled);
}

#[test]
fn a_second_sync_with_no_changes_is_a_no_op_and_advances_nothing() {
    let work = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    fs::write(work.path().join("readings.csv"), b"id,v\n1,10\n").unwrap();

    {
        let mut txn = new_txn(&work, &remote);
        txn.run(IgnorePolicy::default(), None, "genesis", false, &|| false).unwrap();
    }

    let mut second = new_txn(&work, &remote);
    let outcome = second.run(IgnorePolicy::default(), None, "nothing changed", false, &|| false).unwrap();

    assert!(outcome.snapshot_id.is_none());
}

#[test]
fn a_cancel_observed_during_stage_rolls_back_without_touching_the_remote() {
    let work = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    fs::write(work.path().join("readings.csv"), b"id,v\n1,10\n").unwrap();

    let backend_before = HardlinkFs::new(remote.path());
    backend_before.create_dataset().unwrap();
    let snapshots_before = backend_before.list_snapshots().unwrap();
    assert!(snapshots_before.is_empty());

    let mut txn = new_txn(&work, &remote);
    let outcome = txn.run(IgnorePolicy::default(), None, "interrupted", false, &|| true).unwrap();

    assert!(outcome.cancelled);
    assert!(outcome.snapshot_id.is_none());

    let backend_after = HardlinkFs::new(remote.path());
    let snapshots_after = backend_after.list_snapshots().unwrap();
    assert!(snapshots_after.is_empty(), "a cancelled run must not cut a remote snapshot");
    assert!(!work.path().join(".dsg/last-sync.json").exists(), "a cancelled run must not rewrite the local cache");
}

#[test]
fn a_second_edit_then_sync_produces_a_second_chained_snapshot() {
    let work = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    fs::write(work.path().join("readings.csv"), b"id,v\n1,10\n").unwrap();

    {
        let mut txn = new_txn(&work, &remote);
        let outcome = txn.run(IgnorePolicy::default(), None, "genesis", false, &|| false).unwrap();
        assert_eq!(outcome.snapshot_id.as_deref(), Some("s1"));
    }

    fs::write(work.path().join("readings.csv"), b"id,v\n1,10\n2,20\n").unwrap();

    let mut second = new_txn(&work, &remote);
    let outcome = second.run(IgnorePolicy::default(), None, "append row 2", false, &|| false).unwrap();
    assert_eq!(outcome.snapshot_id.as_deref(), Some("s2"));

    let manifest = dsg_core::manifest::Manifest::read_from_file(&work.path().join(".dsg/last-sync.json")).unwrap();
    let metadata = manifest.metadata().unwrap();
    assert_eq!(metadata.previous_snapshot_id.as_deref(), Some("s1"));
    assert!(metadata.verify_chain_link(None).is_err() || metadata.verify_chain_link(Some("not-the-real-prev-hash")).is_err());
}
