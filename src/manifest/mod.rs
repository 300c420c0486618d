//! In-memory and on-disk representation of a snapshot's file set.
//!
//! Per spec §3/§4.3: an ordered mapping from relative path to file entry,
//! plus optional metadata. Equality is insertion-order-irrelevant, but the
//! serialized form always sorts entries by path for deterministic bytes.

pub mod archive;
pub mod entry;
pub mod errors;
pub mod metadata;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use entry::FileEntry;
pub use errors::{IntegrityError, ManifestResult};
pub use metadata::ManifestMetadata;

use crate::hasher::hash_bytes;

/// A manifest: a path-keyed set of file entries plus optional metadata.
///
/// Stored as a `BTreeMap` so that insertion order is irrelevant to equality
/// and iteration order is already path-sorted, matching the canonical
/// on-disk serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, FileEntry>,
    metadata: Option<ManifestMetadata>,
}

/// On-disk JSON shape: `{"entries": [...], "metadata": {...}}`.
#[derive(Serialize, Deserialize)]
struct ManifestWire {
    entries: Vec<FileEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ManifestMetadata>,
}

impl Manifest {
    /// Builds an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any prior entry at the same path.
    pub fn insert(&mut self, entry: FileEntry) {
        self.entries.insert(entry.path().to_string(), entry);
    }

    /// Returns the entry at `path`, if present.
    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    /// Returns `true` if `path` is present in this manifest.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterates entries in path-sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the set of paths present in this manifest.
    pub fn paths(&self) -> std::collections::BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if this manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attaches metadata to this manifest.
    pub fn set_metadata(&mut self, metadata: ManifestMetadata) {
        self.metadata = Some(metadata);
    }

    /// Returns the attached metadata, if any.
    pub fn metadata(&self) -> Option<&ManifestMetadata> {
        self.metadata.as_ref()
    }

    /// Canonical serialization of just the entries (path-sorted, stable
    /// number formatting, UTF-8 bytes) — the input to `entries_hash`.
    pub fn canonical_entries_bytes(&self) -> ManifestResult<Vec<u8>> {
        let entries: Vec<&FileEntry> = self.entries.values().collect();
        serde_json::to_vec(&entries)
            .map_err(|e| IntegrityError::format(format!("failed to canonicalize entries: {e}")))
    }

    /// Hash of the canonical entries serialization.
    pub fn entries_hash(&self) -> ManifestResult<String> {
        Ok(hash_bytes(&self.canonical_entries_bytes()?))
    }

    /// Verifies invariant 3 (spec §3): `entries_hash` and `entry_count` in
    /// the attached metadata agree with recomputation from the entries.
    pub fn verify_entries_integrity(&self) -> ManifestResult<()> {
        let metadata = self
            .metadata
            .as_ref()
            .ok_or_else(|| IntegrityError::integrity("manifest has no attached metadata"))?;

        if metadata.entry_count != self.entries.len() {
            return Err(IntegrityError::integrity(format!(
                "entry_count mismatch: stored {} actual {}",
                metadata.entry_count,
                self.entries.len()
            )));
        }

        let recomputed = self.entries_hash()?;
        if recomputed != metadata.entries_hash {
            return Err(IntegrityError::integrity(format!(
                "entries_hash mismatch: stored {} recomputed {}",
                metadata.entries_hash, recomputed
            )));
        }

        Ok(())
    }

    /// Serializes the whole manifest (entries + metadata) to pretty JSON.
    pub fn to_json(&self) -> ManifestResult<String> {
        let wire = ManifestWire {
            entries: self.entries.values().cloned().collect(),
            metadata: self.metadata.clone(),
        };
        serde_json::to_string_pretty(&wire)
            .map_err(|e| IntegrityError::format(format!("failed to serialize manifest: {e}")))
    }

    /// Parses a manifest from JSON. Unknown fields are ignored for
    /// forward-compatibility.
    pub fn from_json(json: &str) -> ManifestResult<Self> {
        let wire: ManifestWire = serde_json::from_str(json)
            .map_err(|e| IntegrityError::format(format!("failed to parse manifest: {e}")))?;

        let mut manifest = Manifest::new();
        for entry in wire.entries {
            manifest.insert(entry);
        }
        manifest.metadata = wire.metadata;
        Ok(manifest)
    }

    /// Writes the manifest to a file with fsync, write-to-temp + rename for
    /// atomicity (matches the Transaction's cache-rewrite discipline).
    pub fn write_to_file(&self, path: &Path) -> ManifestResult<()> {
        let json = self.to_json()?;
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, json.as_bytes())
            .map_err(|e| IntegrityError::io(format!("failed to write {}", tmp_path.display()), e))?;

        let file = fs::File::open(&tmp_path)
            .map_err(|e| IntegrityError::io(format!("failed to reopen {}", tmp_path.display()), e))?;
        file.sync_all()
            .map_err(|e| IntegrityError::io(format!("failed to fsync {}", tmp_path.display()), e))?;

        fs::rename(&tmp_path, path)
            .map_err(|e| IntegrityError::io(format!("failed to rename into {}", path.display()), e))?;

        Ok(())
    }

    /// Reads a manifest from a file.
    pub fn read_from_file(path: &Path) -> ManifestResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| IntegrityError::io(format!("failed to read {}", path.display()), e))?;
        Self::from_json(&content)
    }
}
