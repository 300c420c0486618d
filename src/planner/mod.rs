//! Translate a `SyncState` map into concrete upload/download/delete/
//! cache-update sets; detect conflicts. Spec §4.6.

use std::collections::BTreeSet;

use crate::merger::SyncState;

/// The set of paths belonging to the engine's own metadata files, always
/// forced into `upload_files` to refresh remote metadata on every sync.
pub const METADATA_FILES: &[&str] = &[
    "last-sync.json",
    "sync-messages.json",
    "tag-messages.json",
];

/// The four operational sets plus cache-only updates and conflicts,
/// produced from a `SyncState` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Paths to copy from L to R.
    pub upload_files: BTreeSet<String>,
    /// Paths to copy from R to L.
    pub download_files: BTreeSet<String>,
    /// Paths to delete from L.
    pub delete_local: BTreeSet<String>,
    /// Paths to delete from R.
    pub delete_remote: BTreeSet<String>,
    /// Paths whose entry in C needs updating, with no data movement.
    pub cache_only_updates: BTreeSet<String>,
    /// Paths in a conflict state; non-empty means the sync must abort.
    pub conflicts: BTreeSet<String>,
}

impl SyncPlan {
    /// `true` if this plan has no data-moving work and no conflicts.
    ///
    /// `upload_files` always carries the forced-in `METADATA_FILES` entries
    /// (see `SyncPlanner::plan`), so those are excluded here: a plan whose
    /// only uploads are the engine's own metadata files is still a no-op.
    pub fn is_no_op(&self) -> bool {
        let real_uploads = self
            .upload_files
            .iter()
            .any(|f| !METADATA_FILES.contains(&f.as_str()));
        !real_uploads
            && self.download_files.is_empty()
            && self.delete_local.is_empty()
            && self.delete_remote.is_empty()
            && self.cache_only_updates.is_empty()
            && self.conflicts.is_empty()
    }
}

/// Produces a `SyncPlan` from a classified `SyncState` map.
pub struct SyncPlanner {
    /// When `true`, state `OnlyC` (cache-only, orphaned cache entry) is
    /// treated as a warning-worthy condition rather than a silent heal.
    /// Decided in DESIGN.md: defaults to `false` (silent heal).
    pub cache_only_strict: bool,
}

impl Default for SyncPlanner {
    fn default() -> Self {
        Self { cache_only_strict: false }
    }
}

impl SyncPlanner {
    /// Builds a planner with the given cache-only strictness.
    pub fn new(cache_only_strict: bool) -> Self {
        Self { cache_only_strict }
    }

    /// Translates a classified state map into a `SyncPlan`.
    ///
    /// Guarantee: the four operational sets are pairwise disjoint; every
    /// input path appears in at most one operational set, or in
    /// `cache_only_updates`, or in `conflicts`, or is dropped as a no-op.
    pub fn plan(&self, states: &std::collections::BTreeMap<String, SyncState>) -> SyncPlan {
        let mut plan = SyncPlan::default();

        for (path, state) in states {
            match state {
                SyncState::AllEq | SyncState::NoneState => {}
                SyncState::AllNe
                | SyncState::LNeCRAbsent
                | SyncState::LNeRCAbsent
                | SyncState::CNeRLAbsent => {
                    plan.conflicts.insert(path.clone());
                }
                SyncState::LEqCNeR => {
                    plan.download_files.insert(path.clone());
                }
                SyncState::CEqRNeL => {
                    plan.upload_files.insert(path.clone());
                }
                SyncState::LEqRNeC => {
                    plan.cache_only_updates.insert(path.clone());
                }
                SyncState::OnlyL => {
                    plan.upload_files.insert(path.clone());
                }
                SyncState::OnlyR => {
                    plan.download_files.insert(path.clone());
                }
                SyncState::OnlyC => {
                    if self.cache_only_strict {
                        plan.conflicts.insert(path.clone());
                    }
                    // Either way, the cache entry is stale and gets
                    // dropped during cache rewrite; it needs no
                    // operational-set entry when healing silently.
                }
                SyncState::LEqCRAbsent => {
                    plan.delete_local.insert(path.clone());
                }
                SyncState::LEqRCAbsent => {
                    plan.cache_only_updates.insert(path.clone());
                }
                SyncState::CEqRLAbsent => {
                    plan.delete_remote.insert(path.clone());
                }
            }
        }

        for metadata_path in METADATA_FILES {
            plan.upload_files.insert((*metadata_path).to_string());
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn states(pairs: &[(&str, SyncState)]) -> BTreeMap<String, SyncState> {
        pairs.iter().map(|(p, s)| (p.to_string(), *s)).collect()
    }

    #[test]
    fn operational_sets_are_pairwise_disjoint() {
        let planner = SyncPlanner::default();
        let input = states(&[
            ("up.csv", SyncState::OnlyL),
            ("down.csv", SyncState::OnlyR),
            ("del_local.csv", SyncState::LEqCRAbsent),
            ("del_remote.csv", SyncState::CEqRLAbsent),
            ("cache_only.csv", SyncState::LEqRNeC),
            ("conflict.csv", SyncState::AllNe),
        ]);
        let plan = planner.plan(&input);

        let sets = [
            &plan.upload_files,
            &plan.download_files,
            &plan.delete_local,
            &plan.delete_remote,
        ];
        for (i, a) in sets.iter().enumerate() {
            for b in sets.iter().skip(i + 1) {
                assert!(a.is_disjoint(b));
            }
        }
    }

    #[test]
    fn metadata_files_always_uploaded() {
        let planner = SyncPlanner::default();
        let plan = planner.plan(&states(&[]));
        for f in METADATA_FILES {
            assert!(plan.upload_files.contains(*f));
        }
    }

    #[test]
    fn conflicts_collect_all_four_conflict_states() {
        let planner = SyncPlanner::default();
        let input = states(&[
            ("a", SyncState::AllNe),
            ("b", SyncState::LNeCRAbsent),
            ("c", SyncState::LNeRCAbsent),
            ("d", SyncState::CNeRLAbsent),
        ]);
        let plan = planner.plan(&input);
        assert_eq!(plan.conflicts.len(), 4);
    }

    #[test]
    fn cache_only_strict_toggles_only_c_handling() {
        let lenient = SyncPlanner::new(false);
        let strict = SyncPlanner::new(true);
        let input = states(&[("stale.csv", SyncState::OnlyC)]);

        assert!(lenient.plan(&input).conflicts.is_empty());
        assert!(strict.plan(&input).conflicts.contains("stale.csv"));
    }

    #[test]
    fn all_eq_and_none_produce_no_operational_entries() {
        let planner = SyncPlanner::default();
        let input = states(&[("a", SyncState::AllEq), ("b", SyncState::NoneState)]);
        let plan = planner.plan(&input);
        assert!(plan.upload_files.iter().all(|f| METADATA_FILES.contains(&f.as_str())));
        assert!(plan.download_files.is_empty());
        assert!(plan.delete_local.is_empty());
        assert!(plan.delete_remote.is_empty());
        assert!(plan.cache_only_updates.is_empty());
        assert!(plan.conflicts.is_empty());
    }

    #[test]
    fn a_plan_with_only_metadata_uploads_is_a_no_op() {
        let planner = SyncPlanner::default();
        let plan = planner.plan(&states(&[("a", SyncState::AllEq)]));
        assert!(plan.is_no_op());
    }

    #[test]
    fn a_plan_with_real_work_is_not_a_no_op() {
        let planner = SyncPlanner::default();
        let plan = planner.plan(&states(&[("a", SyncState::OnlyL)]));
        assert!(!plan.is_no_op());
    }
}
