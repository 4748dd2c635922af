//! # File Catalog
//!
//! In-memory view of the synchronized directory.
//!
//! The catalog enumerates the regular files directly inside the sync
//! directory (non-recursive, subdirectories excluded) and fingerprints each
//! one with a CRC32 checksum at construction time. It is rebuilt fresh for
//! every request rather than cached, so each request observes the
//! filesystem's current state and no shared mutable state needs locking.
//!
//! Two entities are the "same file" for pull matching iff both `filename`
//! and `checksum` match. The collision resolver lives here too: push never
//! silently overwrites an existing file, it renames the incoming one.

use crate::core::packet::FileRecord;
use crate::core::{base64, checksum};
use crate::error::{ProtocolError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// In-memory record of one cataloged file.
///
/// Immutable once constructed; the checksum is computed exactly once, from
/// the file's bytes at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntity {
    path: PathBuf,
    filename: String,
    checksum: String,
}

impl FileEntity {
    /// Build an entity for the file at `path`, computing its checksum.
    pub fn new(path: PathBuf) -> Result<Self> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let checksum = checksum::checksum_file(&path)?;
        Ok(Self {
            path,
            filename,
            checksum,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Wire record without file content (list responses, push receipts).
    pub fn to_record(&self) -> FileRecord {
        FileRecord::new(self.filename.clone(), self.checksum.clone())
    }

    /// Wire record carrying the file's bytes as base64 (pull responses).
    pub fn to_record_with_data(&self) -> Result<FileRecord> {
        let bytes = fs::read(&self.path)?;
        Ok(FileRecord::with_data(
            self.filename.clone(),
            self.checksum.clone(),
            base64::encode(&bytes),
        ))
    }
}

/// Enumerate the regular files directly inside `dir` and fingerprint each.
///
/// Subdirectories are excluded. A file that disappears or becomes
/// unreadable between listing and checksum is skipped with a warning. An
/// unopenable directory is returned as [`ProtocolError::DirectoryUnavailable`],
/// which command dispatch treats as fatal.
pub fn scan(dir: &Path) -> Result<Vec<FileEntity>> {
    let mut entities = Vec::new();

    for entry in read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        match FileEntity::new(entry.path()) {
            Ok(entity) => entities.push(entity),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Skipping unreadable file");
            }
        }
    }

    Ok(entities)
}

/// The raw set of filenames (regular files only) inside `dir`, without
/// checksums. Cheap input for collision resolution during push.
pub fn list_names(dir: &Path) -> Result<HashSet<String>> {
    let mut names = HashSet::new();

    for entry in read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }
        names.insert(entry.file_name().to_string_lossy().into_owned());
    }

    Ok(names)
}

fn read_dir(dir: &Path) -> Result<fs::ReadDir> {
    fs::read_dir(dir).map_err(|source| ProtocolError::DirectoryUnavailable {
        path: dir.display().to_string(),
        source,
    })
}

/// First entity matching both filename and checksum, if any.
pub fn find_match<'a>(
    catalog: &'a [FileEntity],
    filename: &str,
    checksum: &str,
) -> Option<&'a FileEntity> {
    catalog
        .iter()
        .find(|entity| entity.filename() == filename && entity.checksum() == checksum)
}

/// Pick a name for an incoming file that does not collide with `existing`.
///
/// A non-colliding candidate passes through unchanged. Otherwise a
/// disambiguator " (1)" is inserted immediately before the first `.` (or
/// appended when the name has none), and the single digit is walked 1
/// through 9 until a free name is found. All nine suffixes taken is an
/// error; the single-digit limit is intentional and overflow is flagged
/// rather than looped on.
pub fn resolve_collision(candidate: &str, existing: &HashSet<String>) -> Result<String> {
    if !existing.contains(candidate) {
        return Ok(candidate.to_string());
    }

    for n in 1..=9u32 {
        let tag = format!(" ({n})");
        let resolved = match candidate.find('.') {
            Some(dot) => format!("{}{}{}", &candidate[..dot], tag, &candidate[dot..]),
            None => format!("{candidate}{tag}"),
        };
        if !existing.contains(&resolved) {
            return Ok(resolved);
        }
    }

    Err(ProtocolError::FilenameExhausted(candidate.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::fs;

    fn name_set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn scan_builds_entities_with_checksums() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.mp3"), b"hello").expect("write");
        fs::write(dir.path().join("b.mp3"), b"world").expect("write");

        let mut catalog = scan(dir.path()).expect("scan");
        catalog.sort_by(|x, y| x.filename().cmp(y.filename()));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].filename(), "a.mp3");
        assert_eq!(catalog[0].checksum(), "3610a686");
    }

    #[test]
    fn scan_excludes_subdirectories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.mp3"), b"hello").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested").join("c.mp3"), b"inner").expect("write");

        let catalog = scan(dir.path()).expect("scan");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].filename(), "a.mp3");
    }

    #[test]
    fn scan_tolerates_empty_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(scan(dir.path()).expect("scan").is_empty());
    }

    #[test]
    fn scan_reports_unopenable_directory() {
        let err = scan(Path::new("/definitely/not/a/real/directory")).unwrap_err();
        assert!(matches!(err, ProtocolError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn find_match_requires_both_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.mp3"), b"hello").expect("write");
        let catalog = scan(dir.path()).expect("scan");

        assert!(find_match(&catalog, "a.mp3", "3610a686").is_some());
        assert!(find_match(&catalog, "a.mp3", "deadbeef").is_none());
        assert!(find_match(&catalog, "b.mp3", "3610a686").is_none());
    }

    #[test]
    fn record_with_data_is_base64_of_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.mp3"), b"hello").expect("write");
        let catalog = scan(dir.path()).expect("scan");

        let record = catalog[0].to_record_with_data().expect("record");
        assert_eq!(record.data.as_deref(), Some("aGVsbG8="));

        let bare = catalog[0].to_record();
        assert!(bare.data.is_none());
    }

    #[test]
    fn resolve_keeps_free_names_unchanged() {
        assert_eq!(
            resolve_collision("song.mp3", &HashSet::new()).unwrap(),
            "song.mp3"
        );
        assert_eq!(
            resolve_collision("song.mp3", &name_set(&["other.mp3"])).unwrap(),
            "song.mp3"
        );
    }

    #[test]
    fn resolve_inserts_before_first_dot() {
        assert_eq!(
            resolve_collision("song.mp3", &name_set(&["song.mp3"])).unwrap(),
            "song (1).mp3"
        );
        // First dot, not last
        assert_eq!(
            resolve_collision("song.tar.gz", &name_set(&["song.tar.gz"])).unwrap(),
            "song (1).tar.gz"
        );
    }

    #[test]
    fn resolve_appends_when_no_dot() {
        assert_eq!(
            resolve_collision("song", &name_set(&["song"])).unwrap(),
            "song (1)"
        );
    }

    #[test]
    fn resolve_walks_digits_until_free() {
        let existing = name_set(&["song.mp3", "song (1).mp3", "song (2).mp3"]);
        assert_eq!(
            resolve_collision("song.mp3", &existing).unwrap(),
            "song (3).mp3"
        );
    }

    #[test]
    fn resolve_never_returns_an_existing_name() {
        let mut existing = name_set(&["song.mp3"]);
        for _ in 0..9 {
            let resolved = resolve_collision("song.mp3", &existing).unwrap();
            assert!(!existing.contains(&resolved));
            existing.insert(resolved);
        }
    }

    #[test]
    fn resolve_flags_overflow_past_nine() {
        let mut existing = name_set(&["song.mp3"]);
        for n in 1..=9 {
            existing.insert(format!("song ({n}).mp3"));
        }
        assert!(matches!(
            resolve_collision("song.mp3", &existing),
            Err(ProtocolError::FilenameExhausted(_))
        ));
    }
}
