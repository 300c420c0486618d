//! Compressed historical manifests.
//!
//! Per spec §6: `<metadata-dir>/archive/sN-sync.json.<compression>`, one per
//! snapshot, retained unboundedly (spec §9's retention Open Question).

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::errors::{IntegrityError, ManifestResult};
use super::Manifest;

/// File extension used for archived manifests.
pub const COMPRESSION_EXT: &str = "gz";

/// Returns the archive path for a given snapshot id under `archive_dir`.
pub fn archive_path(archive_dir: &Path, snapshot_id: &str) -> PathBuf {
    archive_dir.join(format!("{snapshot_id}-sync.json.{COMPRESSION_EXT}"))
}

/// Compresses a manifest's JSON form and writes it to
/// `<archive_dir>/<snapshot_id>-sync.json.gz`.
pub fn archive_manifest(
    archive_dir: &Path,
    snapshot_id: &str,
    manifest: &Manifest,
) -> ManifestResult<PathBuf> {
    fs::create_dir_all(archive_dir)
        .map_err(|e| IntegrityError::io(format!("failed to create {}", archive_dir.display()), e))?;

    let json = manifest.to_json()?;
    let path = archive_path(archive_dir, snapshot_id);

    let file = fs::File::create(&path)
        .map_err(|e| IntegrityError::io(format!("failed to create {}", path.display()), e))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(json.as_bytes())
        .map_err(|e| IntegrityError::io(format!("failed to write {}", path.display()), e))?;
    encoder
        .finish()
        .map_err(|e| IntegrityError::io(format!("failed to finish {}", path.display()), e))?;

    Ok(path)
}

/// Reads and decompresses an archived manifest.
pub fn read_archived_manifest(archive_dir: &Path, snapshot_id: &str) -> ManifestResult<Manifest> {
    let path = archive_path(archive_dir, snapshot_id);
    let file = fs::File::open(&path)
        .map_err(|e| IntegrityError::io(format!("failed to open {}", path.display()), e))?;

    let mut decoder = GzDecoder::new(file);
    let mut json = String::new();
    decoder
        .read_to_string(&mut json)
        .map_err(|e| IntegrityError::io(format!("failed to decompress {}", path.display()), e))?;

    Manifest::from_json(&json)
}
