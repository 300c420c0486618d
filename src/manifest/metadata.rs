//! Manifest metadata: the per-snapshot record that makes history
//! self-describing (spec §3, §9 "Metadata as data").

use serde::{Deserialize, Serialize};

use super::errors::{IntegrityError, ManifestResult};
use crate::hasher::hash_bytes;

/// The engine's manifest format version. Bumped whenever the canonical
/// serialization or hash algorithm changes.
pub const FORMAT_VERSION: &str = "0.1.0";

/// Per-snapshot metadata record (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestMetadata {
    /// Format-version string, e.g. `"0.1.0"`.
    pub format_version: String,
    /// Short stable snapshot token, e.g. `"s1"`, `"s2"`, ...
    pub snapshot_id: String,
    /// Creation timestamp, ISO-8601.
    pub created_at: String,
    /// User id of the creator.
    pub creator: String,
    /// Number of entries in the manifest.
    pub entry_count: usize,
    /// Hash of the canonical serialization of all entries.
    pub entries_hash: String,
    /// Free-text snapshot message.
    pub snapshot_message: String,
    /// Previous snapshot id; `None` for the genesis.
    pub previous_snapshot_id: Option<String>,
    /// Hash of `entries_hash ⊕ snapshot_message ⊕ previous_snapshot_hash`.
    pub snapshot_hash: String,
    /// Optional free-text notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ManifestMetadata {
    /// Computes the snapshot-hash chain link from its three components.
    ///
    /// `snapshot_hash = H(entries_hash || snapshot_message || previous_snapshot_hash_or_empty)`
    pub fn compute_snapshot_hash(
        entries_hash: &str,
        snapshot_message: &str,
        previous_snapshot_hash: Option<&str>,
    ) -> String {
        let mut buf = String::new();
        buf.push_str(entries_hash);
        buf.push_str(snapshot_message);
        buf.push_str(previous_snapshot_hash.unwrap_or(""));
        hash_bytes(buf.as_bytes())
    }

    /// Builds a new metadata record, computing `entries_hash` and
    /// `snapshot_hash` from the given entries serialization.
    pub fn new(
        snapshot_id: impl Into<String>,
        created_at: impl Into<String>,
        creator: impl Into<String>,
        entry_count: usize,
        entries_hash: impl Into<String>,
        snapshot_message: impl Into<String>,
        previous_snapshot_id: Option<String>,
        previous_snapshot_hash: Option<&str>,
    ) -> Self {
        let entries_hash = entries_hash.into();
        let snapshot_message = snapshot_message.into();
        let snapshot_hash =
            Self::compute_snapshot_hash(&entries_hash, &snapshot_message, previous_snapshot_hash);

        Self {
            format_version: FORMAT_VERSION.to_string(),
            snapshot_id: snapshot_id.into(),
            created_at: created_at.into(),
            creator: creator.into(),
            entry_count,
            entries_hash,
            snapshot_message,
            previous_snapshot_id,
            snapshot_hash,
            notes: None,
        }
    }

    /// Verifies that `snapshot_hash` is consistent with its inputs.
    pub fn verify_chain_link(&self, previous_snapshot_hash: Option<&str>) -> ManifestResult<()> {
        let expected = Self::compute_snapshot_hash(
            &self.entries_hash,
            &self.snapshot_message,
            previous_snapshot_hash,
        );
        if expected != self.snapshot_hash {
            return Err(IntegrityError::chain(format!(
                "snapshot {} hash mismatch: stored {} recomputed {}",
                self.snapshot_id, self.snapshot_hash, expected
            )));
        }
        Ok(())
    }
}
