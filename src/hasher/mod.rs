//! Content hashing for regular files.
//!
//! Per spec §4.1: for two files with identical byte sequences the hash is
//! identical; the function is collision-resistant for practical purposes.
//! Symlinks are never hashed. Empty files have a well-defined hash.
//!
//! Backed by SHA-256 (the `sha2` crate); the algorithm is recorded in the
//! manifest format-version rather than in the hash string itself.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::DsgResult;

const CHUNK_SIZE: usize = 8192;

/// Computes the content hash of an in-memory byte slice.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Computes the content hash of a file on disk, streaming in fixed-size
/// chunks so large files do not need to be held in memory.
pub fn hash_file(path: &Path) -> DsgResult<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use std::fs;

    #[test]
    fn identical_bytes_hash_identically() {
        let a = hash_bytes(b"hello world");
        let b = hash_bytes(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn different_bytes_hash_differently() {
        let a = hash_bytes(b"hello world");
        let b = hash_bytes(b"hello worlD");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_input_has_well_defined_hash() {
        let h = hash_bytes(b"");
        assert_eq!(
            h,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn file_hash_matches_byte_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, b"id,v\n1,10\n").unwrap();

        let file_hash = hash_file(&path).unwrap();
        let byte_hash = hash_bytes(b"id,v\n1,10\n");
        assert_eq!(file_hash, byte_hash);
    }

    #[test]
    fn large_file_streams_in_chunks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let data = vec![0x42u8; CHUNK_SIZE * 3 + 17];
        fs::write(&path, &data).unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&data));
    }
}
