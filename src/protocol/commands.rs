//! Command handlers: translate validated request packets into filesystem
//! operations and build the single response packet each one owes.
//!
//! Every handler re-scans the directory so it works against the
//! filesystem's current state; nothing is cached between requests. File
//! I/O here is synchronous and runs to completion within the calling
//! session's task.

use crate::catalog::{self, FileEntity};
use crate::core::base64;
use crate::core::packet::{response_packet, FileRecord, PacketType};
use crate::error::{ProtocolError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Serve a `listRequest`: every cataloged file as filename + checksum,
/// no content.
pub fn list(directory: &Path) -> Result<Value> {
    let entities = catalog::scan(directory)?;
    let records = entities.iter().map(FileEntity::to_record).collect();
    Ok(response_packet(PacketType::ListResponse, records))
}

/// Serve a `pullRequest`: requested items that match a cataloged file on
/// both filename and checksum come back with base64 content. Non-matching
/// items are silently omitted, not errors.
pub fn pull(directory: &Path, items: &[FileRecord]) -> Result<Value> {
    let entities = catalog::scan(directory)?;

    let mut records = Vec::new();
    for item in items {
        if let Some(entity) = catalog::find_match(&entities, &item.filename, &item.checksum) {
            records.push(entity.to_record_with_data()?);
        }
    }

    Ok(response_packet(PacketType::PullResponse, records))
}

/// Serve a `pushRequest`: decode and write each incoming file under a
/// collision-free name, then verify the written bytes against the claimed
/// checksum. A mismatch deletes the file and emits a diagnostic, but the
/// item is still reported in the response so the client sees what the
/// server observed.
pub fn push(directory: &Path, items: &[FileRecord]) -> Result<Value> {
    let mut existing = catalog::list_names(directory)?;

    let mut records = Vec::new();
    for item in items {
        let Some(data) = item.data.as_deref() else {
            return Err(ProtocolError::InvalidRequest(format!(
                "push item {} carries no data",
                item.filename
            )));
        };

        let name = match catalog::resolve_collision(&item.filename, &existing) {
            Ok(name) => name,
            Err(e) => {
                warn!(filename = %item.filename, error = %e, "Skipping push item");
                continue;
            }
        };

        let path = directory.join(&name);
        fs::write(&path, base64::decode(data))?;
        // Later items in this request must not reuse the name
        existing.insert(name);

        let entity = FileEntity::new(path.clone())?;
        if entity.checksum() != item.checksum {
            warn!(
                filename = %entity.filename(),
                claimed = %item.checksum,
                actual = %entity.checksum(),
                "Checksum mismatch, probable write or decode error"
            );
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "Failed to remove corrupt file");
            }
        }

        records.push(entity.to_record());
    }

    Ok(response_packet(PacketType::PushResponse, records))
}

/// Render a request's filenames as "(a.mp3, b.mp3)" for the event log.
pub fn pretty_file_list(items: &[FileRecord]) -> String {
    let names: Vec<&str> = items.iter().map(|item| item.filename.as_str()).collect();
    format!("({})", names.join(", "))
}
