//! End-to-end check of the classify → plan pipeline against a small,
//! realistic three-way manifest set, exercised through the public API
//! only (no internals reached into).

use dsg_core::manifest::{FileEntry, Manifest};
use dsg_core::merger::ManifestMerger;
use dsg_core::planner::SyncPlanner;

fn file(path: &str, hash: &str) -> FileEntry {
    FileEntry::RegularFile {
        path: path.to_string(),
        user: "alice@example.org".to_string(),
        filesize: 42,
        mtime: "2026-01-01T00:00:00+00:00".to_string(),
        hash: hash.to_string(),
    }
}

#[test]
fn realistic_three_way_diff_produces_a_disjoint_plan() {
    let mut l = Manifest::new();
    l.insert(file("unchanged.csv", "h1"));
    l.insert(file("edited_locally.csv", "h2-local"));
    l.insert(file("new_locally.csv", "h3"));
    l.insert(file("remote_deleted_locally.csv", "h4"));

    let mut c = Manifest::new();
    c.insert(file("unchanged.csv", "h1"));
    c.insert(file("edited_locally.csv", "h2"));
    c.insert(file("remote_deleted_locally.csv", "h4"));
    c.insert(file("local_deleted_remotely.csv", "h5"));

    let mut r = Manifest::new();
    r.insert(file("unchanged.csv", "h1"));
    r.insert(file("edited_locally.csv", "h2"));
    r.insert(file("new_remotely.csv", "h6"));
    r.insert(file("local_deleted_remotely.csv", "h5"));

    let states = ManifestMerger::classify(&l, &c, &r);
    assert_eq!(states.len(), 6);

    let planner = SyncPlanner::default();
    let plan = planner.plan(&states);

    assert!(plan.upload_files.contains("edited_locally.csv"));
    assert!(plan.upload_files.contains("new_locally.csv"));
    assert!(plan.download_files.contains("new_remotely.csv"));
    assert!(plan.delete_local.contains("local_deleted_remotely.csv"));
    assert!(plan.delete_remote.contains("remote_deleted_locally.csv"));
    assert!(plan.conflicts.is_empty());

    let sets = [&plan.upload_files, &plan.download_files, &plan.delete_local, &plan.delete_remote];
    for (i, a) in sets.iter().enumerate() {
        for b in sets.iter().skip(i + 1) {
            assert!(a.is_disjoint(b), "operational sets must stay pairwise disjoint");
        }
    }
}

#[test]
fn a_three_way_divergence_is_flagged_as_a_conflict_and_blocks_movement() {
    let mut l = Manifest::new();
    l.insert(file("contested.csv", "from-laptop"));
    let mut c = Manifest::new();
    c.insert(file("contested.csv", "original"));
    let mut r = Manifest::new();
    r.insert(file("contested.csv", "from-server"));

    let states = ManifestMerger::classify(&l, &c, &r);
    let planner = SyncPlanner::default();
    let plan = planner.plan(&states);

    assert!(plan.conflicts.contains("contested.csv"));
    assert!(!plan.upload_files.contains("contested.csv"));
    assert!(!plan.download_files.contains("contested.csv"));
}
