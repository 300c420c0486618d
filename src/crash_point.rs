//! Crash point injection for testing transaction durability.
//!
//! When a crash point is enabled via `DSG_CRASH_POINT`, the process
//! terminates immediately via `std::process::abort()` — no cleanup, no
//! unwinding, no catching. Used only by the crash test suite to assert
//! phase rollback and at-most-once-commit repair under simulated
//! interruption (spec §4.10, §8).

use std::sync::OnceLock;

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT.get_or_init(|| std::env::var("DSG_CRASH_POINT").ok()).as_deref()
}

/// Returns `true` if `DSG_CRASH_POINT` equals `name`.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Aborts the process if the named crash point is enabled; a no-op
/// otherwise.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] triggering crash at point: {name}");
        std::process::abort();
    }
}

/// Named crash points placed at the boundaries of the transaction phases
/// (spec §4.10).
pub mod points {
    /// Before the staging clone is created.
    pub const STAGE_BEFORE_CLONE: &str = "stage_before_clone";
    /// After upload/download/delete edits are applied to the clone.
    pub const STAGE_AFTER_APPLY: &str = "stage_after_apply";
    /// After the staged manifest passes verification.
    pub const VERIFY_AFTER_CHECK: &str = "verify_after_check";
    /// After `promote`, before the new named snapshot is cut.
    pub const COMMIT_AFTER_PROMOTE: &str = "commit_after_promote";
    /// After the named snapshot is cut, before the HistoryIndex is updated.
    pub const COMMIT_AFTER_SNAPSHOT: &str = "commit_after_snapshot";
    /// After the HistoryIndex is updated, before C is rewritten.
    pub const COMMIT_AFTER_HISTORY: &str = "commit_after_history";
    /// Before staging artifacts are destroyed.
    pub const CLEANUP_BEFORE_DESTROY: &str = "cleanup_before_destroy";

    /// All defined crash point names.
    pub fn all() -> &'static [&'static str] {
        &[
            STAGE_BEFORE_CLONE,
            STAGE_AFTER_APPLY,
            VERIFY_AFTER_CHECK,
            COMMIT_AFTER_PROMOTE,
            COMMIT_AFTER_SNAPSHOT,
            COMMIT_AFTER_HISTORY,
            CLEANUP_BEFORE_DESTROY,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_default() {
        assert!(!crash_point_enabled("test_point"));
    }

    #[test]
    fn all_points_are_defined() {
        assert_eq!(points::all().len(), 7);
        assert!(points::all().contains(&"commit_after_promote"));
    }

    #[test]
    fn names_are_lowercase_with_underscores() {
        for point in points::all() {
            assert!(point.chars().all(|c| c.is_lowercase() || c == '_'));
        }
    }
}
