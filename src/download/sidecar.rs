//! Source records written alongside stored documents.
//!
//! A stored `name.pdf` gets a `name.json` holding the URL it was fetched from.
//! Paths are derived from titles, so two documents can map to the same slot
//! across runs; the record tells a later run whether the file at a path is
//! the document it is about to store there.

use std::fs;
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced while writing a source record.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// I/O error writing the record.
    #[error("I/O error writing source record: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Provenance of one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// URL the document was fetched from.
    pub source_url: String,
}

/// Derives the record path from a document path.
///
/// - `order.pdf` → `order.json`
/// - `no_extension` → `no_extension.json`
#[must_use]
pub fn sidecar_path(document: &Path) -> PathBuf {
    let mut path = document.to_path_buf();
    path.set_extension("json");
    path
}

/// Reads the source record of `document`, if one exists and parses.
#[must_use]
pub fn read_source(document: &Path) -> Option<SourceRecord> {
    let path = sidecar_path(document);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "unreadable source record");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(record) => Some(record),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "malformed source record");
            None
        }
    }
}

/// Writes (or replaces) the source record of `document`.
///
/// # Errors
///
/// Returns [`SidecarError`] on I/O or serialization failure.
pub fn write_source(document: &Path, source_url: &str) -> Result<PathBuf, SidecarError> {
    let path = sidecar_path(document);
    let record = SourceRecord {
        source_url: source_url.to_string(),
    };
    let write_result = fs::File::create(&path)
        .map_err(SidecarError::from)
        .and_then(|file| {
            serde_json::to_writer_pretty(BufWriter::new(file), &record).map_err(SidecarError::from)
        });
    if let Err(err) = write_result {
        let _ = fs::remove_file(&path);
        return Err(err);
    }
    debug!(path = %path.display(), "source record written");
    Ok(path)
}

/// True if a complete file sits at `document` and is not recorded as coming from `source_url`.
///
/// Zero-byte files are unfinished downloads and belong to nobody. A non-empty
/// file without a readable record counts as held by another document.
#[must_use]
pub fn is_held_by_other(document: &Path, source_url: &str) -> bool {
    let complete = fs::metadata(document).is_ok_and(|meta| meta.is_file() && meta.len() > 0);
    complete && read_source(document).is_none_or(|record| record.source_url != source_url)
}
