//! `filename::fix` must be idempotent on a broad set of offending paths,
//! and a batch `Normalizer` pass over a real directory tree must converge
//! to a state where the scanner raises no further warnings.

use std::fs;
use std::os::unix::fs as unix_fs;

use dsg_core::filename::{fix, validate_path, Normalizer};
use tempfile::TempDir;

const OFFENDING_PATHS: &[&str] = &[
    "report~",
    "CON.txt",
    "LPT1",
    "weird<>name.csv",
    "  leading and trailing  .csv",
    "dir/nested~/child.csv",
    "a\u{200B}b.csv",
    "line\u{2028}break.csv",
    "\u{0007}bell.csv",
    "already_fine/path.csv",
];

#[test]
fn fix_converges_to_a_stable_point_for_every_offending_path() {
    for path in OFFENDING_PATHS {
        let (once, _) = fix(path);
        let (twice, changed_again) = fix(&once);
        assert_eq!(once, twice, "fix({path}) did not converge");
        assert!(!changed_again);
    }
}

#[test]
fn a_batch_normalize_pass_over_a_real_tree_leaves_no_residual_warnings() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("report~"), b"x").unwrap();
    fs::create_dir_all(dir.path().join("CON.txt")).unwrap();
    fs::write(dir.path().join("CON.txt").join("inner.csv"), b"x").unwrap();
    unix_fs::symlink("report~", dir.path().join("link_to_report")).unwrap();

    let warned: Vec<String> = vec![
        "report~".to_string(),
        "CON.txt".to_string(),
        "link_to_report".to_string(),
    ];

    let normalizer = Normalizer::new(dir.path());
    let first_pass = normalizer.normalize_batch(&warned);
    assert!(first_pass.errors.is_empty(), "first pass errors: {:?}", first_pass.errors);
    assert!(first_pass.has_changes());

    let renamed_paths: Vec<String> = first_pass.renamed.iter().map(|(_, new)| new.clone()).collect();
    let second_pass = normalizer.normalize_batch(&renamed_paths);
    assert!(!second_pass.has_changes(), "a second pass over already-fixed paths must be a no-op");
    assert!(second_pass.errors.is_empty());

    for path in &renamed_paths {
        assert!(validate_path(path).is_none(), "path {path} still carries validation warnings after normalization");
    }
}

#[test]
fn already_clean_tree_produces_no_warnings() {
    let clean_paths = ["data/2026/jan.csv", "notes.md", "src/lib.rs"];
    for path in clean_paths {
        assert!(validate_path(path).is_none());
        let (fixed, changed) = fix(path);
        assert_eq!(fixed, path);
        assert!(!changed);
    }
}
