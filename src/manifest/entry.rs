//! File entry types: the tagged union of regular files and symlinks.
//!
//! Per spec §3: a `RegularFile` carries path, size, mtime, content hash and
//! writer id; a `Symlink` carries path and a target reference that must
//! resolve within the repository root. Symlinks are never hashed. Equality
//! rules are defined in spec §4.3 and implemented in `PartialEq` below.

use serde::{Deserialize, Serialize};

/// A single entry in a manifest: either a regular file or a symlink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileEntry {
    /// A regular file.
    #[serde(rename = "file")]
    RegularFile {
        /// Relative, canonical forward-slash path.
        path: String,
        /// User id of the writer.
        user: String,
        /// Byte size.
        filesize: u64,
        /// Last-modification timestamp, ISO-8601, fixed repository timezone.
        mtime: String,
        /// Content hash; empty string when hashing was disabled at scan time.
        hash: String,
    },
    /// A symlink.
    #[serde(rename = "symlink")]
    Symlink {
        /// Relative, canonical forward-slash path of the link itself.
        path: String,
        /// The link's textual target, a relative path that must not escape
        /// the repository root once resolved against the link's parent.
        reference: String,
        /// User id of the writer.
        user: String,
        /// Last-modification timestamp.
        mtime: String,
    },
}

impl FileEntry {
    /// Returns the entry's relative path.
    pub fn path(&self) -> &str {
        match self {
            FileEntry::RegularFile { path, .. } => path,
            FileEntry::Symlink { path, .. } => path,
        }
    }

    /// Returns `true` if this entry is a regular file.
    pub fn is_regular_file(&self) -> bool {
        matches!(self, FileEntry::RegularFile { .. })
    }

    /// Returns `true` if this entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileEntry::Symlink { .. })
    }
}

impl PartialEq for FileEntry {
    /// Per spec §4.3:
    /// - RegularFile ↔ RegularFile: compare by hash when both sides have a
    ///   non-empty hash; otherwise fall back to (size, mtime, path).
    /// - Symlink ↔ Symlink: compare by reference string only.
    /// - Different variants are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                FileEntry::RegularFile { path: p1, filesize: s1, mtime: m1, hash: h1, .. },
                FileEntry::RegularFile { path: p2, filesize: s2, mtime: m2, hash: h2, .. },
            ) => {
                if !h1.is_empty() && !h2.is_empty() {
                    h1 == h2
                } else {
                    s1 == s2 && m1 == m2 && p1 == p2
                }
            }
            (
                FileEntry::Symlink { reference: r1, .. },
                FileEntry::Symlink { reference: r2, .. },
            ) => r1 == r2,
            _ => false,
        }
    }
}

impl Eq for FileEntry {}
