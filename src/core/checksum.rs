//! # Checksum
//!
//! CRC32 fingerprints over raw file bytes, rendered as lowercase hex.
//!
//! Uses [`crc32fast`] for the standard reflected CRC32 (0xEDB88320
//! polynomial class). Checksums fingerprint cataloged files and verify
//! files after a push write; the hex rendering carries no fixed width or
//! padding so it can be compared as a plain string on the wire.

use crate::error::Result;
use crc32fast::Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const READ_BUF_SIZE: usize = 8 * 1024;

/// CRC32 of an in-memory buffer, as a lowercase hex string.
pub fn checksum_bytes(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// CRC32 of a file's full content, as a lowercase hex string.
///
/// Streams the file through a fixed-size buffer rather than loading it
/// whole; file payloads can be as large as the frame limit allows.
pub fn checksum_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; READ_BUF_SIZE];

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
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::fs;

    #[test]
    fn known_value_for_hello() {
        assert_eq!(checksum_bytes(b"hello"), "3610a686");
    }

    #[test]
    fn empty_input() {
        assert_eq!(checksum_bytes(b""), "0");
    }

    #[test]
    fn single_byte_change_changes_checksum() {
        let a = checksum_bytes(b"hello world");
        let b = checksum_bytes(b"hello worle");
        assert_ne!(a, b);
    }

    #[test]
    fn file_checksum_matches_bytes_checksum() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.mp3");
        fs::write(&path, b"hello").expect("write");

        assert_eq!(checksum_file(&path).expect("checksum"), "3610a686");
        assert_eq!(
            checksum_file(&path).expect("checksum"),
            checksum_bytes(b"hello")
        );
    }

    #[test]
    fn file_checksum_is_stable_across_calls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stable.bin");
        fs::write(&path, vec![0x42u8; 100_000]).expect("write");

        let first = checksum_file(&path).expect("checksum");
        let second = checksum_file(&path).expect("checksum");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(checksum_file("/definitely/not/here.bin").is_err());
    }
}
