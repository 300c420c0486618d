//! Traverse a working tree honoring ignore rules; produce a manifest.
//!
//! Per spec §4.2: walk the tree once, never following directories through
//! symlinks, apply ignore rules, NFC-normalize paths (warning when a path
//! was not already NFC), and optionally skip hashing.

pub mod errors;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::is_nfc;

pub use errors::{ScanError, ScanResult};

use crate::filename::{validate_path, ValidationCause, ValidationWarning};
use crate::hasher::hash_file;
use crate::manifest::{FileEntry, Manifest};

/// Ignore policy: exact names, path suffixes, and exact relative paths.
#[derive(Debug, Clone, Default)]
pub struct IgnorePolicy {
    /// Component names to ignore wherever they occur (e.g. `.git`).
    pub names: BTreeSet<String>,
    /// Path suffixes to ignore (e.g. `.pyc`).
    pub suffixes: BTreeSet<String>,
    /// Exact relative paths to ignore.
    pub paths: BTreeSet<String>,
}

impl IgnorePolicy {
    /// Returns `true` if `relative_path` (forward-slash, relative) should be
    /// excluded from the manifest.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        if self.paths.contains(relative_path) {
            return true;
        }
        if self
            .suffixes
            .iter()
            .any(|suffix| relative_path.ends_with(suffix.as_str()))
        {
            return true;
        }
        relative_path
            .split('/')
            .any(|component| self.names.contains(component))
    }
}

/// Scan configuration (spec §4.2).
pub struct ScanOptions {
    /// Root directory to walk.
    pub root: PathBuf,
    /// Ignore policy.
    pub ignore: IgnorePolicy,
    /// Name of the engine's metadata directory, e.g. `.dsg`.
    pub metadata_dir_name: String,
    /// Whether to include the metadata directory in the scan.
    pub include_metadata_dir: bool,
    /// Candidate top-level directories; `None` means all top-level entries
    /// are candidates.
    pub data_dirs: Option<BTreeSet<String>>,
    /// Whether to compute content hashes (disabling yields empty hashes).
    pub compute_hashes: bool,
    /// User id recorded as the writer of each entry.
    pub user_id: String,
}

impl ScanOptions {
    /// Builds scan options with sensible defaults for a bare root.
    pub fn new(root: impl Into<PathBuf>, user_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ignore: IgnorePolicy::default(),
            metadata_dir_name: ".dsg".to_string(),
            include_metadata_dir: false,
            data_dirs: None,
            compute_hashes: true,
            user_id: user_id.into(),
        }
    }
}

/// Walks `options.root` and produces a manifest plus validation warnings.
pub fn scan(options: &ScanOptions) -> ScanResult<(Manifest, Vec<ValidationWarning>)> {
    let mut manifest = Manifest::new();
    let mut warnings = Vec::new();

    walk_dir(options, &options.root, "", &mut manifest, &mut warnings)?;

    Ok((manifest, warnings))
}

fn walk_dir(
    options: &ScanOptions,
    abs_dir: &Path,
    rel_prefix: &str,
    manifest: &mut Manifest,
    warnings: &mut Vec<ValidationWarning>,
) -> ScanResult<()> {
    let read_dir = fs::read_dir(abs_dir).map_err(|e| ScanError::io(abs_dir, e))?;

    let mut entries: Vec<_> = read_dir
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScanError::io(abs_dir, e))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let rel_path = if rel_prefix.is_empty() {
            name.clone()
        } else {
            format!("{rel_prefix}/{name}")
        };

        if rel_prefix.is_empty() {
            if !options.include_metadata_dir && name == options.metadata_dir_name {
                continue;
            }
            if let Some(data_dirs) = &options.data_dirs {
                let abs = entry.path();
                let is_dir = fs::symlink_metadata(&abs)
                    .map(|m| m.file_type().is_dir())
                    .unwrap_or(false);
                if is_dir && !data_dirs.contains(&name) {
                    continue;
                }
            }
        }

        if options.ignore.is_ignored(&rel_path) {
            continue;
        }

        let abs_path = entry.path();
        let meta = fs::symlink_metadata(&abs_path).map_err(|e| ScanError::io(&abs_path, e))?;

        if meta.file_type().is_symlink() {
            handle_symlink(options, &abs_path, &rel_path, manifest, warnings)?;
        } else if meta.file_type().is_dir() {
            walk_dir(options, &abs_path, &rel_path, manifest, warnings)?;
        } else {
            handle_regular_file(options, &abs_path, &rel_path, &meta, manifest, warnings)?;
        }
    }

    Ok(())
}

fn normalized_path(rel_path: &str, warnings: &mut Vec<ValidationWarning>) -> String {
    if is_nfc(rel_path) {
        rel_path.to_string()
    } else {
        warnings.push(ValidationWarning {
            path: rel_path.to_string(),
            causes: vec![ValidationCause::NonNfc],
        });
        rel_path.nfc().collect()
    }
}

fn push_other_warnings(rel_path: &str, warnings: &mut Vec<ValidationWarning>) {
    if let Some(mut w) = validate_path(rel_path) {
        w.causes.retain(|c| *c != ValidationCause::NonNfc);
        if !w.causes.is_empty() {
            warnings.push(w);
        }
    }
}

fn handle_regular_file(
    options: &ScanOptions,
    abs_path: &Path,
    rel_path: &str,
    meta: &fs::Metadata,
    manifest: &mut Manifest,
    warnings: &mut Vec<ValidationWarning>,
) -> ScanResult<()> {
    push_other_warnings(rel_path, warnings);
    let path = normalized_path(rel_path, warnings);

    let hash = if options.compute_hashes {
        hash_file(abs_path).map_err(|_| ScanError::io(abs_path, std::io::Error::new(std::io::ErrorKind::Other, "hash failed")))?
    } else {
        String::new()
    };

    let mtime = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
        .to_rfc3339();

    manifest.insert(FileEntry::RegularFile {
        path,
        user: options.user_id.clone(),
        filesize: meta.len(),
        mtime,
        hash,
    });

    Ok(())
}

fn handle_symlink(
    options: &ScanOptions,
    abs_path: &Path,
    rel_path: &str,
    manifest: &mut Manifest,
    warnings: &mut Vec<ValidationWarning>,
) -> ScanResult<()> {
    let target = fs::read_link(abs_path).map_err(|e| ScanError::io(abs_path, e))?;
    let target_str = target.to_string_lossy().to_string();

    if escapes_root(rel_path, &target_str) {
        warnings.push(ValidationWarning {
            path: rel_path.to_string(),
            causes: vec![ValidationCause::PathEscape],
        });
        return Ok(());
    }

    push_other_warnings(rel_path, warnings);
    let path = normalized_path(rel_path, warnings);

    let meta = fs::symlink_metadata(abs_path).map_err(|e| ScanError::io(abs_path, e))?;
    let mtime = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
        .to_rfc3339();

    manifest.insert(FileEntry::Symlink {
        path,
        reference: target_str,
        user: options.user_id.clone(),
        mtime,
    });

    Ok(())
}

/// Resolves `target` relative to `link_path`'s parent and checks whether
/// the result would lie outside the repository root (spec invariant 2).
fn escapes_root(link_path: &str, target: &str) -> bool {
    if Path::new(target).is_absolute() {
        return true;
    }

    let parent_depth = link_path.split('/').count().saturating_sub(1);
    let mut depth: i64 = parent_depth as i64;
    for component in target.split('/') {
        match component {
            "" | "." => continue,
            ".." => depth -= 1,
            _ => depth += 1,
        }
        if depth < 0 {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs as unix_fs;
    use tempfile::TempDir;

    #[test]
    fn scans_regular_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), b"id,v\n1,10\n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.csv"), b"data").unwrap();

        let options = ScanOptions::new(dir.path(), "alice@example.org");
        let (manifest, warnings) = scan(&options).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(manifest.len(), 2);
        assert!(manifest.contains("a.csv"));
        assert!(manifest.contains("sub/b.csv"));
    }

    #[test]
    fn ignores_configured_names() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), b"ref").unwrap();
        fs::write(dir.path().join("a.csv"), b"data").unwrap();

        let mut options = ScanOptions::new(dir.path(), "alice@example.org");
        options.ignore.names.insert(".git".to_string());

        let (manifest, _) = scan(&options).unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.contains("a.csv"));
    }

    #[test]
    fn does_not_follow_symlinked_directories() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("x.csv"), b"data").unwrap();
        unix_fs::symlink(&real, dir.path().join("linked_dir")).unwrap();

        let options = ScanOptions::new(dir.path(), "alice@example.org");
        let (manifest, _) = scan(&options).unwrap();

        // linked_dir itself is recorded as a symlink entry; its contents
        // (real/x.csv via the link) are not walked through.
        assert!(manifest.contains("linked_dir"));
        assert!(!manifest.contains("linked_dir/x.csv"));
        assert!(manifest.contains("real/x.csv"));
    }

    #[test]
    fn flags_escaping_symlink_target() {
        let dir = TempDir::new().unwrap();
        unix_fs::symlink("../../etc/passwd", dir.path().join("bad_link")).unwrap();

        let options = ScanOptions::new(dir.path(), "alice@example.org");
        let (manifest, warnings) = scan(&options).unwrap();

        assert!(!manifest.contains("bad_link"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].causes.contains(&ValidationCause::PathEscape));
    }

    #[test]
    fn accepts_symlink_within_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("target.csv"), b"data").unwrap();
        unix_fs::symlink("target.csv", dir.path().join("link.csv")).unwrap();

        let options = ScanOptions::new(dir.path(), "alice@example.org");
        let (manifest, warnings) = scan(&options).unwrap();

        assert!(warnings.is_empty());
        assert!(manifest.contains("link.csv"));
    }

    #[test]
    fn disabling_hashes_yields_empty_hash_strings() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.csv"), b"data").unwrap();

        let mut options = ScanOptions::new(dir.path(), "alice@example.org");
        options.compute_hashes = false;

        let (manifest, _) = scan(&options).unwrap();
        match manifest.get("a.csv").unwrap() {
            FileEntry::RegularFile { hash, .. } => assert!(hash.is_empty()),
            _ => panic!("expected regular file"),
        }
    }

    #[test]
    fn data_dirs_filters_top_level_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("included")).unwrap();
        fs::write(dir.path().join("included/a.csv"), b"data").unwrap();
        fs::create_dir(dir.path().join("excluded")).unwrap();
        fs::write(dir.path().join("excluded/b.csv"), b"data").unwrap();

        let mut options = ScanOptions::new(dir.path(), "alice@example.org");
        options.data_dirs = Some(["included".to_string()].into_iter().collect());

        let (manifest, _) = scan(&options).unwrap();
        assert!(manifest.contains("included/a.csv"));
        assert!(!manifest.contains("excluded/b.csv"));
    }
}
