//! Stable, filesystem-safe output paths for retained documents.
//!
//! A document lands at `{case_dir}/{category}/{case_slug}__{title_slug}.pdf`
//! under the downloads root. Every component is derived from the case and the
//! document title only, never from content, so re-runs map the same document
//! to the same path. Collisions get a numeric suffix on the title part. A
//! complete file counts as a collision unless its source record names the
//! same URL; a zero-byte file is an unfinished download and is reused rather
//! than skipped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::DocumentType;
use crate::download::is_held_by_other;

/// Maximum length of the case slug and of the pretty case folder name.
pub const MAX_CASE_DIR_LEN: usize = 80;

/// Maximum length of the title slug (the combined stem is capped at twice this).
pub const MAX_FILE_STEM_LEN: usize = 96;

/// Extension given to every stored document.
pub const DOCUMENT_EXTENSION: &str = "pdf";

const CASE_PLACEHOLDER: &str = "case";
const TITLE_PLACEHOLDER: &str = "document";

/// Lower-cases `value` and collapses every non-alphanumeric run to one hyphen.
///
/// Only ASCII letters and digits survive; the result has no leading or
/// trailing hyphen and may be empty.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_hyphen = false;
    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Makes a human-readable folder name from a case title.
///
/// Path separators become hyphens and anything outside ASCII letters, digits,
/// space, underscore, hyphen and period is dropped. May be empty.
#[must_use]
pub fn safe_folder_name(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_separator_run = false;
    for ch in value.trim().chars() {
        if ch == '/' || ch == '\\' {
            if !in_separator_run {
                out.push('-');
            }
            in_separator_run = true;
            continue;
        }
        in_separator_run = false;
        if ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '_' | '-' | '.') {
            out.push(ch);
        }
    }
    out.trim().to_string()
}

/// Caps `value` at `max_len` characters, trimming trailing separators left by the cut.
#[must_use]
pub fn truncate_component(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let cut: String = value.chars().take(max_len).collect();
    let trimmed = cut.trim_end_matches(['-', '_', ' ']);
    if trimmed.is_empty() {
        cut
    } else {
        trimmed.to_string()
    }
}

/// Folder names derived for one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDirs {
    /// Local folder name, `{pretty}__{slug}` unless the slug is already part of it.
    pub local: String,
    /// Folder name used inside the archive.
    pub archive: String,
    /// Case slug used as file name prefix.
    pub slug: String,
}

/// Derives the case folder names from the case title and page path.
///
/// The slug prefers the page path; the pretty name prefers the title.
#[must_use]
pub fn build_case_dirs(case_title: &str, case_path: &str) -> CaseDirs {
    let title_source = [case_title, case_path]
        .into_iter()
        .find(|s| !s.trim().is_empty())
        .unwrap_or(CASE_PLACEHOLDER);
    let slug_source = if case_path.trim().is_empty() {
        title_source
    } else {
        case_path
    };

    let slug = truncate_component(&slugify(slug_source), MAX_CASE_DIR_LEN);
    let pretty = truncate_component(&safe_folder_name(title_source), MAX_CASE_DIR_LEN);

    let mut local = pretty;
    if !slug.is_empty() && !local.contains(&slug) {
        local = truncate_component(&format!("{local}__{slug}"), MAX_CASE_DIR_LEN * 2);
    }

    let or_placeholder = |value: &str| {
        if value.is_empty() {
            CASE_PLACEHOLDER.to_string()
        } else {
            value.to_string()
        }
    };

    let archive = if slug.is_empty() {
        or_placeholder(&local)
    } else {
        slug.clone()
    };
    let local = if local.is_empty() {
        or_placeholder(&slug)
    } else {
        local
    };

    CaseDirs {
        local,
        archive,
        slug: or_placeholder(&slug),
    }
}

/// Location of one stored document, relative to the downloads root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPath {
    /// Local case folder.
    pub case_dir: String,
    /// Case folder inside the archive.
    pub archive_case_dir: String,
    /// Category folder for the document type.
    pub category_dir: &'static str,
    /// File name without extension.
    pub stem: String,
}

impl StoredPath {
    /// File name including the extension.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{DOCUMENT_EXTENSION}", self.stem)
    }

    /// Path relative to the downloads root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.case_dir)
            .join(self.category_dir)
            .join(self.file_name())
    }

    /// Absolute path under `root`.
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }

    /// Entry name inside the archive (always `/`-separated).
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!(
            "{}/{}/{}",
            self.archive_case_dir,
            self.category_dir,
            self.file_name()
        )
    }
}

/// Returns true if a complete (non-empty) file already occupies `path`.
fn is_occupied(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.len() > 0)
}

/// Builds the output path for a document, resolving collisions.
///
/// A candidate path is taken when it is in `existing_paths` (already assigned
/// in this run) or when a non-empty file exists at it under `root`. Taken
/// paths get `-2`, `-3`, ... appended to the title part. A zero-byte file is
/// not a collision: the path is returned so the download can be redone.
#[must_use]
pub fn build_path(
    root: &Path,
    case_title: &str,
    case_path: &str,
    doc_type: DocumentType,
    doc_title: &str,
    existing_paths: &HashSet<PathBuf>,
) -> StoredPath {
    resolve_slot(root, case_title, case_path, doc_type, doc_title, |path| {
        existing_paths.contains(path) || is_occupied(path)
    })
}

/// Assigns the output path for the document fetched from `source_url`.
///
/// A slot is taken when it was already assigned in this run, or when it holds
/// a complete file whose source record names another URL (or has no record).
/// A complete file recorded for `source_url` is not a collision, so a re-run
/// maps every document back to the file it stored before, whatever order the
/// case page lists its attachments in.
#[must_use]
pub fn assign_path(
    root: &Path,
    case_title: &str,
    case_path: &str,
    doc_type: DocumentType,
    doc_title: &str,
    source_url: &str,
    assigned: &HashSet<PathBuf>,
) -> StoredPath {
    resolve_slot(root, case_title, case_path, doc_type, doc_title, |path| {
        assigned.contains(path) || is_held_by_other(path, source_url)
    })
}

fn resolve_slot(
    root: &Path,
    case_title: &str,
    case_path: &str,
    doc_type: DocumentType,
    doc_title: &str,
    is_taken: impl Fn(&Path) -> bool,
) -> StoredPath {
    let dirs = build_case_dirs(case_title, case_path);

    let mut title_slug = slugify(doc_title);
    if title_slug.is_empty() {
        title_slug = TITLE_PLACEHOLDER.to_string();
    }
    let title_slug = truncate_component(&title_slug, MAX_FILE_STEM_LEN);

    let make = |suffix: Option<usize>| {
        let stem = match suffix {
            Some(n) => format!("{}__{title_slug}-{n}", dirs.slug),
            None => format!("{}__{title_slug}", dirs.slug),
        };
        StoredPath {
            case_dir: dirs.local.clone(),
            archive_case_dir: dirs.archive.clone(),
            category_dir: doc_type.folder(),
            stem: truncate_component(&stem, MAX_FILE_STEM_LEN * 2),
        }
    };

    let mut stored = make(None);
    let mut counter = 2;
    loop {
        let absolute = stored.resolve(root);
        if !is_taken(&absolute) {
            break;
        }
        debug!(path = %absolute.display(), "path taken, trying next suffix");
        stored = make(Some(counter));
        counter += 1;
    }
    stored
}
