//! Batch repair of warned paths: rename files/dirs on disk, rewrite
//! dependent symlink targets. Idempotent (spec §4.4).

use std::fs;
use std::os::unix::fs as unix_fs;
use std::path::Path;

use super::fix;

/// Structured report of a normalization pass, grounded on the original's
/// `NormalizationResult` dataclass (renamed-file list, rewritten-symlink
/// list, per-path errors).
#[derive(Debug, Clone, Default)]
pub struct NormalizationReport {
    /// `(old_path, new_path)` for every file or directory renamed.
    pub renamed: Vec<(String, String)>,
    /// `(symlink_path, old_target, new_target)` for every rewritten symlink.
    pub symlinks_fixed: Vec<(String, String, String)>,
    /// `(path, error_message)` for every rename/rewrite that failed.
    pub errors: Vec<(String, String)>,
}

impl NormalizationReport {
    /// `true` if any rename, symlink fix, or error was recorded.
    pub fn has_changes(&self) -> bool {
        !self.renamed.is_empty() || !self.symlinks_fixed.is_empty()
    }
}

/// Applies `fix()` to a batch of warned relative paths under `root`.
pub struct Normalizer<'a> {
    root: &'a Path,
}

impl<'a> Normalizer<'a> {
    /// Builds a normalizer rooted at the working tree root.
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Normalizes every path in `warned_paths`, applying renames and symlink
    /// target rewrites on disk. Regular files/dirs whose own path is
    /// already valid are skipped; symlinks are always inspected, since a
    /// symlink can need repair purely because of its *target* string
    /// while its own path stays unchanged.
    pub fn normalize_batch(&self, warned_paths: &[String]) -> NormalizationReport {
        let mut report = NormalizationReport::default();

        for path in warned_paths {
            let (fixed, changed) = fix(path);
            let old_abs = self.root.join(path);

            let metadata = match fs::symlink_metadata(&old_abs) {
                Ok(m) => m,
                Err(e) => {
                    if changed {
                        report.errors.push((path.clone(), format!("cannot stat: {e}")));
                    }
                    continue;
                }
            };

            if metadata.file_type().is_symlink() {
                let new_abs = self.root.join(&fixed);
                self.fix_symlink(path, &fixed, &old_abs, &new_abs, &mut report);
            } else if changed {
                let new_abs = self.root.join(&fixed);
                self.rename_entry(path, &fixed, &old_abs, &new_abs, &mut report);
            }
        }

        report
    }

    fn rename_entry(
        &self,
        old_path: &str,
        new_path: &str,
        old_abs: &Path,
        new_abs: &Path,
        report: &mut NormalizationReport,
    ) {
        if new_abs.exists() {
            report.errors.push((
                old_path.to_string(),
                format!("target already exists: {new_path}"),
            ));
            return;
        }

        if let Some(parent) = new_abs.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                report
                    .errors
                    .push((old_path.to_string(), format!("cannot create parent dir: {e}")));
                return;
            }
        }

        match fs::rename(old_abs, new_abs) {
            Ok(()) => report.renamed.push((old_path.to_string(), new_path.to_string())),
            Err(e) => report
                .errors
                .push((old_path.to_string(), format!("rename failed: {e}"))),
        }
    }

    fn fix_symlink(
        &self,
        old_path: &str,
        new_path: &str,
        old_abs: &Path,
        new_abs: &Path,
        report: &mut NormalizationReport,
    ) {
        let target = match fs::read_link(old_abs) {
            Ok(t) => t,
            Err(e) => {
                report
                    .errors
                    .push((old_path.to_string(), format!("cannot read link: {e}")));
                return;
            }
        };
        let target_str = target.to_string_lossy().to_string();
        let (fixed_target, target_changed) = fix(&target_str);

        // Rename the link itself if its own path needed repair.
        if old_path != new_path {
            if new_abs.exists() {
                report.errors.push((
                    old_path.to_string(),
                    format!("target already exists: {new_path}"),
                ));
                return;
            }
            if let Err(e) = fs::rename(old_abs, new_abs) {
                report
                    .errors
                    .push((old_path.to_string(), format!("rename failed: {e}")));
                return;
            }
            report.renamed.push((old_path.to_string(), new_path.to_string()));
        }

        if target_changed {
            if let Err(e) = fs::remove_file(new_abs) {
                report
                    .errors
                    .push((old_path.to_string(), format!("cannot remove old link: {e}")));
                return;
            }
            if let Err(e) = unix_fs::symlink(&fixed_target, new_abs) {
                report
                    .errors
                    .push((old_path.to_string(), format!("cannot recreate link: {e}")));
                return;
            }
            report
                .symlinks_fixed
                .push((new_path.to_string(), target_str, fixed_target));
        }
    }
}
