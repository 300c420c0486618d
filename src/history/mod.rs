//! Append-only record of snapshot metadata and optional tags.
//!
//! Per spec §4.9: `sync-messages.json` maps snapshot-id to its full
//! metadata record; `tag-messages.json` lists symbolic aliases. Tags never
//! rewrite the chain.

pub mod errors;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use errors::{HistoryError, HistoryResult};

use crate::manifest::ManifestMetadata;

/// A symbolic alias for a snapshot id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagEntry {
    /// Unique tag identifier, e.g. `"v1.2.0-initial-release"`.
    pub tag_id: String,
    /// The snapshot this tag points to.
    pub snapshot_id: String,
    /// Free-text tag message.
    pub tag_message: String,
    /// User id of the tag's creator.
    pub created_by: String,
    /// Creation timestamp, ISO-8601.
    pub created_at: String,
}

/// The append-only snapshot/tag history, mirrored locally into C.
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    messages: BTreeMap<String, ManifestMetadata>,
    tags: Vec<TagEntry>,
}

impl HistoryIndex {
    /// Builds an empty history index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a snapshot's metadata record. Refuses to overwrite an
    /// existing record for the same snapshot id (append-only).
    pub fn append_snapshot(&mut self, metadata: ManifestMetadata) -> HistoryResult<()> {
        if self.messages.contains_key(&metadata.snapshot_id) {
            return Err(HistoryError::new(format!(
                "snapshot {} already recorded",
                metadata.snapshot_id
            )));
        }
        self.messages.insert(metadata.snapshot_id.clone(), metadata);
        Ok(())
    }

    /// Returns the metadata record for `snapshot_id`, if present.
    pub fn get(&self, snapshot_id: &str) -> Option<&ManifestMetadata> {
        self.messages.get(snapshot_id)
    }

    /// Adds a tag. Tag ids must be unique.
    pub fn add_tag(&mut self, tag: TagEntry) -> HistoryResult<()> {
        if self.tags.iter().any(|t| t.tag_id == tag.tag_id) {
            return Err(HistoryError::new(format!("tag {} already exists", tag.tag_id)));
        }
        self.tags.push(tag);
        Ok(())
    }

    /// Returns every tag, in the order they were added.
    pub fn tags(&self) -> &[TagEntry] {
        &self.tags
    }

    /// Resolves a tag id to its snapshot id.
    pub fn resolve_tag(&self, tag_id: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.tag_id == tag_id)
            .map(|t| t.snapshot_id.as_str())
    }

    /// Writes `sync-messages.json` and `tag-messages.json` under `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> HistoryResult<()> {
        fs::create_dir_all(dir).map_err(|e| HistoryError::io("failed to create metadata dir", e))?;

        let messages_json = serde_json::to_string_pretty(&self.messages)
            .map_err(|e| HistoryError::new(format!("failed to serialize sync-messages: {e}")))?;
        fs::write(dir.join("sync-messages.json"), messages_json)
            .map_err(|e| HistoryError::io("failed to write sync-messages.json", e))?;

        let tags_json = serde_json::to_string_pretty(&self.tags)
            .map_err(|e| HistoryError::new(format!("failed to serialize tag-messages: {e}")))?;
        fs::write(dir.join("tag-messages.json"), tags_json)
            .map_err(|e| HistoryError::io("failed to write tag-messages.json", e))?;

        Ok(())
    }

    /// Reads `sync-messages.json` and `tag-messages.json` from `dir`. A
    /// missing `tag-messages.json` is treated as an empty tag list.
    pub fn read_from_dir(dir: &Path) -> HistoryResult<Self> {
        let messages_path = dir.join("sync-messages.json");
        let messages: BTreeMap<String, ManifestMetadata> = if messages_path.exists() {
            let content = fs::read_to_string(&messages_path)
                .map_err(|e| HistoryError::io("failed to read sync-messages.json", e))?;
            serde_json::from_str(&content)
                .map_err(|e| HistoryError::new(format!("failed to parse sync-messages.json: {e}")))?
        } else {
            BTreeMap::new()
        };

        let tags_path = dir.join("tag-messages.json");
        let tags: Vec<TagEntry> = if tags_path.exists() {
            let content = fs::read_to_string(&tags_path)
                .map_err(|e| HistoryError::io("failed to read tag-messages.json", e))?;
            serde_json::from_str(&content)
                .map_err(|e| HistoryError::new(format!("failed to parse tag-messages.json: {e}")))?
        } else {
            Vec::new()
        };

        Ok(Self { messages, tags })
    }
}

/// A parsed, sortable version tag: `v<major>[.<minor>[.<patch>]][-<description>]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionTag {
    /// Sortable `(major, minor, patch)` tuple.
    pub version: (u32, u32, u32),
    /// Optional free-text description suffix.
    pub description: Option<String>,
}

/// Parses a tag id as a version tag, if it matches the documented pattern.
pub fn parse_version_tag(tag_id: &str) -> Option<VersionTag> {
    let re = Regex::new(r"^v(\d+)(?:\.(\d+)(?:\.(\d+))?)?(?:-(.+))?$").unwrap();
    let caps = re.captures(tag_id)?;

    let major: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minor: u32 = caps
        .get(2)
        .map(|m| m.as_str().parse().unwrap_or(0))
        .unwrap_or(0);
    let patch: u32 = caps
        .get(3)
        .map(|m| m.as_str().parse().unwrap_or(0))
        .unwrap_or(0);
    let description = caps.get(4).map(|m| m.as_str().to_string());

    Some(VersionTag { version: (major, minor, patch), description })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata(snapshot_id: &str) -> ManifestMetadata {
        ManifestMetadata::new(
            snapshot_id,
            "2026-01-01T00:00:00+00:00",
            "alice@example.org",
            0,
            "entrieshash",
            "msg",
            None,
            None,
        )
    }

    #[test]
    fn append_only_refuses_duplicate_snapshot_ids() {
        let mut idx = HistoryIndex::new();
        idx.append_snapshot(metadata("s1")).unwrap();
        assert!(idx.append_snapshot(metadata("s1")).is_err());
    }

    #[test]
    fn tags_are_unique() {
        let mut idx = HistoryIndex::new();
        let tag = TagEntry {
            tag_id: "v1.0.0".to_string(),
            snapshot_id: "s1".to_string(),
            tag_message: "release".to_string(),
            created_by: "alice@example.org".to_string(),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        };
        idx.add_tag(tag.clone()).unwrap();
        assert!(idx.add_tag(tag).is_err());
    }

    #[test]
    fn write_and_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut idx = HistoryIndex::new();
        idx.append_snapshot(metadata("s1")).unwrap();
        idx.add_tag(TagEntry {
            tag_id: "v1.0.0".to_string(),
            snapshot_id: "s1".to_string(),
            tag_message: "release".to_string(),
            created_by: "alice@example.org".to_string(),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        })
        .unwrap();

        idx.write_to_dir(dir.path()).unwrap();
        let loaded = HistoryIndex::read_from_dir(dir.path()).unwrap();

        assert_eq!(loaded.get("s1"), idx.get("s1"));
        assert_eq!(loaded.tags(), idx.tags());
    }

    #[test]
    fn version_tags_parse_and_sort() {
        let a = parse_version_tag("v1.2.3-initial-release").unwrap();
        assert_eq!(a.version, (1, 2, 3));
        assert_eq!(a.description.as_deref(), Some("initial-release"));

        let b = parse_version_tag("v1").unwrap();
        assert_eq!(b.version, (1, 0, 0));

        let c = parse_version_tag("v2.0").unwrap();
        assert_eq!(c.version, (2, 0, 0));

        assert!(a < c);
        assert!(parse_version_tag("not-a-version").is_none());
    }
}
