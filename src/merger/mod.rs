//! Three-way classification L×C×R → SyncState for every observed path.
//!
//! Per spec §4.5: a pure function of three manifests; no I/O, no hidden
//! state. The 15 states are named after the original's `sLCR__*`
//! convention (`SyncState.sLCR__all_ne` etc. in `src/dsg/core/lifecycle.py`)
//! cased as idiomatic Rust identifiers.

use std::collections::BTreeMap;

use crate::manifest::Manifest;

/// One of the 15 classifications of a path across L (working copy), C
/// (cache), and R (remote). See spec §4.5's table for the full
/// presence/equality matrix and the associated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SyncState {
    /// Present in all three; all equal. Action: none.
    AllEq,
    /// Present in all three; all differ. Action: CONFLICT.
    AllNe,
    /// Present in all three; L=C, R differs. Action: download R→L; update C.
    LEqCNeR,
    /// Present in all three; C=R, L differs. Action: upload L→R; update C.
    CEqRNeL,
    /// Present in all three; L=R, C differs. Action: update C only.
    LEqRNeC,
    /// Only in L. Action: upload L→R; add to C.
    OnlyL,
    /// Only in R. Action: download R→L; add to C.
    OnlyR,
    /// Only in C. Action: remove from C (cleanup).
    OnlyC,
    /// In L and C, R absent; L=C. Action: delete L; remove from C.
    LEqCRAbsent,
    /// In L and C, R absent; L≠C. Action: CONFLICT.
    LNeCRAbsent,
    /// In L and R, C absent; L=R. Action: update C only.
    LEqRCAbsent,
    /// In L and R, C absent; L≠R. Action: CONFLICT.
    LNeRCAbsent,
    /// In C and R, L absent; C=R. Action: delete R; remove from C.
    CEqRLAbsent,
    /// In C and R, L absent; C≠R. Action: CONFLICT.
    CNeRLAbsent,
    /// Absent from all three. Action: no-op.
    NoneState,
}

impl SyncState {
    /// `true` for the four states that require user intervention (spec §7).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SyncState::AllNe
                | SyncState::LNeCRAbsent
                | SyncState::LNeRCAbsent
                | SyncState::CNeRLAbsent
        )
    }
}

/// Classifies every path observed across L, C, and R into a `SyncState`.
///
/// Pure function: no I/O, no hidden state. Identical inputs yield identical
/// output regardless of iteration order (spec invariant 5).
pub struct ManifestMerger;

impl ManifestMerger {
    /// Produces the per-path `SyncState` map for the three manifests.
    pub fn classify(l: &Manifest, c: &Manifest, r: &Manifest) -> BTreeMap<String, SyncState> {
        let mut all_paths = l.paths();
        all_paths.extend(c.paths());
        all_paths.extend(r.paths());

        let mut result = BTreeMap::new();
        for path in all_paths {
            let le = l.get(&path);
            let ce = c.get(&path);
            let re = r.get(&path);
            let state = classify_one(le, ce, re);
            result.insert(path, state);
        }
        result
    }
}

fn classify_one(
    l: Option<&crate::manifest::FileEntry>,
    c: Option<&crate::manifest::FileEntry>,
    r: Option<&crate::manifest::FileEntry>,
) -> SyncState {
    match (l, c, r) {
        (Some(l), Some(c), Some(r)) => {
            if l == c && c == r {
                SyncState::AllEq
            } else if l == c && c != r {
                SyncState::LEqCNeR
            } else if c == r && l != c {
                SyncState::CEqRNeL
            } else if l == r && c != l {
                SyncState::LEqRNeC
            } else {
                SyncState::AllNe
            }
        }
        (Some(_), None, None) => SyncState::OnlyL,
        (None, None, Some(_)) => SyncState::OnlyR,
        (None, Some(_), None) => SyncState::OnlyC,
        (Some(l), Some(c), None) => {
            if l == c {
                SyncState::LEqCRAbsent
            } else {
                SyncState::LNeCRAbsent
            }
        }
        (Some(l), None, Some(r)) => {
            if l == r {
                SyncState::LEqRCAbsent
            } else {
                SyncState::LNeRCAbsent
            }
        }
        (None, Some(c), Some(r)) => {
            if c == r {
                SyncState::CEqRLAbsent
            } else {
                SyncState::CNeRLAbsent
            }
        }
        (None, None, None) => SyncState::NoneState,
    }
}
