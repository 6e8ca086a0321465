//! Index files and the archive bundle.
//!
//! Every retained document gets one [`IndexRow`], downloaded or not. The rows
//! are written as CSV and as an XLSX workbook next to the downloads, and both
//! index files plus every stored document are packed into one zip archive.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Column order of the index files.
pub const INDEX_COLUMNS: [&str; 9] = [
    "case_title",
    "case_url",
    "case_path",
    "doc_type",
    "doc_title",
    "doc_date_display",
    "doc_url",
    "local_path",
    "not_downloaded",
];

/// Value of `not_downloaded` for documents without a stored file.
pub const NOT_DOWNLOADED_MARKER: &str = "NOT DOWNLOADED";

/// CSV index file name.
pub const CSV_INDEX_FILE_NAME: &str = "cma_ieo_derogs_revocations_index.csv";

/// Spreadsheet index file name.
pub const XLSX_INDEX_FILE_NAME: &str = "cma_ieo_derogs_revocations_index.xlsx";

/// Archive file name.
pub const ARCHIVE_FILE_NAME: &str = "cma_initial_orders_derogs_revocations.zip";

/// Errors writing index files or the archive.
#[derive(Debug, Error)]
pub enum IndexError {
    /// File system error.
    #[error("IO error writing {path}: {source}")]
    Io {
        /// File being written or read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization error.
    #[error("CSV error writing {path}: {source}")]
    Csv {
        /// CSV file being written.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Spreadsheet error.
    #[error("XLSX error writing {path}: {source}")]
    Xlsx {
        /// Workbook being written.
        path: PathBuf,
        /// The underlying workbook error.
        #[source]
        source: XlsxError,
    },

    /// Zip archive error.
    #[error("archive error writing {path}: {source}")]
    Archive {
        /// Archive being written.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },
}

impl IndexError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    fn xlsx(path: impl Into<PathBuf>, source: XlsxError) -> Self {
        Self::Xlsx {
            path: path.into(),
            source,
        }
    }

    fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }
}

/// One line of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub case_title: String,
    pub case_url: String,
    pub case_path: String,
    /// Document type label.
    pub doc_type: String,
    pub doc_title: String,
    pub doc_date_display: String,
    pub doc_url: String,
    /// Stored file, empty when the document was not downloaded.
    pub local_path: String,
    /// [`NOT_DOWNLOADED_MARKER`] or empty.
    pub not_downloaded: String,
}

impl IndexRow {
    /// Fills `local_path` and `not_downloaded` from the stored path, if any.
    #[must_use]
    pub fn with_local_path(mut self, local_path: Option<&Path>) -> Self {
        match local_path {
            Some(path) => {
                self.local_path = path.display().to_string();
                self.not_downloaded.clear();
            }
            None => {
                self.local_path.clear();
                self.not_downloaded = NOT_DOWNLOADED_MARKER.to_string();
            }
        }
        self
    }

    /// Field values in [`INDEX_COLUMNS`] order.
    #[must_use]
    pub fn fields(&self) -> [&str; 9] {
        [
            &self.case_title,
            &self.case_url,
            &self.case_path,
            &self.doc_type,
            &self.doc_title,
            &self.doc_date_display,
            &self.doc_url,
            &self.local_path,
            &self.not_downloaded,
        ]
    }

    /// True if the document has a stored file.
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        !self.local_path.is_empty()
    }

    fn sort_key_cmp(&self, other: &Self) -> Ordering {
        (&self.case_title, &self.doc_type, &self.doc_title).cmp(&(
            &other.case_title,
            &other.doc_type,
            &other.doc_title,
        ))
    }
}

/// Sorts rows by case title, document type label and document title.
pub fn sort_rows(rows: &mut [IndexRow]) {
    rows.sort_by(IndexRow::sort_key_cmp);
}

/// A stored document to include in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File on disk.
    pub source: PathBuf,
    /// `/`-separated name inside the archive.
    pub name: String,
}

/// Writes the CSV index. The header is written even when `rows` is empty.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv(path: &Path, rows: &[IndexRow]) -> Result<(), IndexError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| IndexError::csv(path, e))?;
    writer
        .write_record(INDEX_COLUMNS)
        .map_err(|e| IndexError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| IndexError::csv(path, e))?;
    }
    writer.flush().map_err(|e| IndexError::io(path, e))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote CSV index");
    Ok(())
}

/// Writes the spreadsheet index: one sheet, bold header row, one row per document.
///
/// # Errors
///
/// Returns an error if the workbook cannot be built or saved.
pub fn write_xlsx(path: &Path, rows: &[IndexRow]) -> Result<(), IndexError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("index")
        .map_err(|e| IndexError::xlsx(path, e))?;

    for (col, name) in (0u16..).zip(INDEX_COLUMNS) {
        worksheet
            .write_string_with_format(0, col, name, &header_format)
            .map_err(|e| IndexError::xlsx(path, e))?;
    }
    for (line, row) in (1u32..).zip(rows) {
        for (col, value) in (0u16..).zip(row.fields()) {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(line, col, value)
                .map_err(|e| IndexError::xlsx(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| IndexError::xlsx(path, e))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote XLSX index");
    Ok(())
}

/// Writes the zip archive and returns the number of documents packed.
///
/// `index_files` are stored at the archive root under their file names.
/// Entries whose source file no longer exists are skipped, and so is any entry
/// whose name is already in the archive.
///
/// # Errors
///
/// Returns an error if the archive cannot be written or a file cannot be read.
pub fn write_archive(
    path: &Path,
    index_files: &[PathBuf],
    entries: &[ArchiveEntry],
) -> Result<usize, IndexError> {
    let file = File::create(path).map_err(|e| IndexError::io(path, e))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut names: HashSet<String> = HashSet::new();
    for index_file in index_files {
        let name = index_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        names.insert(name.clone());
        add_file(&mut zip, path, index_file, name, options)?;
    }

    let mut packed = 0;
    for entry in entries {
        if !entry.source.is_file() {
            warn!(path = %entry.source.display(), "stored file vanished, not archived");
            continue;
        }
        if !names.insert(entry.name.clone()) {
            warn!(
                path = %entry.source.display(),
                name = %entry.name,
                "archive name already used, not archived"
            );
            continue;
        }
        add_file(&mut zip, path, &entry.source, entry.name.clone(), options)?;
        packed += 1;
    }

    zip.finish().map_err(|e| IndexError::archive(path, e))?;
    debug!(path = %path.display(), documents = packed, "wrote archive");
    Ok(packed)
}

fn add_file(
    zip: &mut zip::ZipWriter<File>,
    archive_path: &Path,
    source: &Path,
    name: String,
    options: SimpleFileOptions,
) -> Result<(), IndexError> {
    let mut input = File::open(source).map_err(|e| IndexError::io(source, e))?;
    zip.start_file(name, options)
        .map_err(|e| IndexError::archive(archive_path, e))?;
    std::io::copy(&mut input, zip).map_err(|e| IndexError::io(archive_path, e))?;
    Ok(())
}

/// Paths of the files written by [`write_bundle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
    pub archive: PathBuf,
    /// Number of documents packed into the archive.
    pub archived_documents: usize,
}

/// Writes both index files and the archive into `out_dir`.
///
/// # Errors
///
/// Returns the first error from any of the writers.
pub fn write_bundle(
    out_dir: &Path,
    rows: &[IndexRow],
    entries: &[ArchiveEntry],
) -> Result<BundlePaths, IndexError> {
    let csv = out_dir.join(CSV_INDEX_FILE_NAME);
    let xlsx = out_dir.join(XLSX_INDEX_FILE_NAME);
    let archive = out_dir.join(ARCHIVE_FILE_NAME);

    write_csv(&csv, rows)?;
    write_xlsx(&xlsx, rows)?;
    let archived_documents = write_archive(&archive, &[csv.clone(), xlsx.clone()], entries)?;

    info!(
        csv = %csv.display(),
        xlsx = %xlsx.display(),
        archive = %archive.display(),
        rows = rows.len(),
        archived_documents,
        "wrote index and archive"
    );
    Ok(BundlePaths {
        csv,
        xlsx,
        archive,
        archived_documents,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(case_title: &str, doc_type: &str, doc_title: &str) -> IndexRow {
        IndexRow {
            case_title: case_title.to_string(),
            case_url: "https://www.gov.uk/cma-cases/x".to_string(),
            case_path: "/cma-cases/x".to_string(),
            doc_type: doc_type.to_string(),
            doc_title: doc_title.to_string(),
            doc_url: format!("https://assets.publishing.service.gov.uk/{doc_title}.pdf"),
            ..IndexRow::default()
        }
        .with_local_path(None)
    }

    fn archive_names(path: &Path) -> Vec<String> {
        let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_with_local_path_sets_marker() {
        let missing = row("A", "Derogation", "d");
        assert_eq!(missing.not_downloaded, NOT_DOWNLOADED_MARKER);
        assert!(!missing.is_downloaded());

        let present = missing.with_local_path(Some(Path::new("/out/downloads/a.pdf")));
        assert_eq!(present.local_path, "/out/downloads/a.pdf");
        assert_eq!(present.not_downloaded, "");
        assert!(present.is_downloaded());
    }

    #[test]
    fn test_sort_rows_by_case_type_title() {
        let mut rows = vec![
            row("B case", "Derogation", "z"),
            row("A case", "Revocation order", "a"),
            row("A case", "Derogation", "b"),
            row("A case", "Derogation", "a"),
        ];
        sort_rows(&mut rows);
        let keys: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|r| (r.case_title.as_str(), r.doc_type.as_str(), r.doc_title.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("A case", "Derogation", "a"),
                ("A case", "Derogation", "b"),
                ("A case", "Revocation order", "a"),
                ("B case", "Derogation", "z"),
            ]
        );
    }

    #[test]
    fn test_write_csv_empty_has_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.csv");
        write_csv(&path, &[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), INDEX_COLUMNS.join(","));
    }

    #[test]
    fn test_write_csv_rows_follow_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.csv");
        write_csv(&path, &[row("Alpha, Beta", "Derogation", "Consent")]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, INDEX_COLUMNS);
        let records: Vec<IndexRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].case_title, "Alpha, Beta");
        assert_eq!(records[0].not_downloaded, NOT_DOWNLOADED_MARKER);
    }

    fn zip_entry_text(path: &Path, name: &str) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut text = String::new();
        std::io::Read::read_to_string(&mut entry, &mut text).unwrap();
        text
    }

    #[test]
    fn test_write_xlsx_has_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.xlsx");
        write_xlsx(&path, &[row("Example Merger", "Derogation", "Consent")]).unwrap();

        // An xlsx workbook is itself a zip package.
        let strings = zip_entry_text(&path, "xl/sharedStrings.xml");
        for column in INDEX_COLUMNS {
            assert!(strings.contains(column), "missing header {column}");
        }
        assert!(strings.contains("Example Merger"));
        assert!(strings.contains(NOT_DOWNLOADED_MARKER));
    }

    #[test]
    fn test_write_xlsx_empty_still_writes_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.xlsx");
        write_xlsx(&path, &[]).unwrap();

        let strings = zip_entry_text(&path, "xl/sharedStrings.xml");
        assert!(strings.contains("not_downloaded"));
    }

    #[test]
    fn test_write_archive_skips_duplicate_names() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.pdf");
        let second = temp_dir.path().join("second.pdf");
        std::fs::write(&first, b"%PDF-first").unwrap();
        std::fs::write(&second, b"%PDF-second").unwrap();
        let name = "cma-cases-x/Derogations/doc.pdf".to_string();
        let entries = vec![
            ArchiveEntry {
                source: first,
                name: name.clone(),
            },
            ArchiveEntry {
                source: second,
                name: name.clone(),
            },
        ];

        let archive = temp_dir.path().join("bundle.zip");
        let packed = write_archive(&archive, &[], &entries).unwrap();

        assert_eq!(packed, 1);
        assert_eq!(archive_names(&archive), vec![name.clone()]);
        assert_eq!(zip_entry_text(&archive, &name), "%PDF-first");
    }

    #[test]
    fn test_write_bundle_archives_index_and_documents() {
        let temp_dir = TempDir::new().unwrap();
        let stored = temp_dir.path().join("downloads").join("doc.pdf");
        std::fs::create_dir_all(stored.parent().unwrap()).unwrap();
        std::fs::write(&stored, b"%PDF").unwrap();

        let entries = vec![
            ArchiveEntry {
                source: stored.clone(),
                name: "cma-cases-x/Derogations/doc.pdf".to_string(),
            },
            ArchiveEntry {
                source: temp_dir.path().join("missing.pdf"),
                name: "cma-cases-x/Derogations/missing.pdf".to_string(),
            },
        ];
        let rows = vec![row("A", "Derogation", "doc").with_local_path(Some(&stored))];

        let paths = write_bundle(temp_dir.path(), &rows, &entries).unwrap();

        assert_eq!(paths.archived_documents, 1);
        assert_eq!(
            archive_names(&paths.archive),
            vec![
                "cma-cases-x/Derogations/doc.pdf".to_string(),
                CSV_INDEX_FILE_NAME.to_string(),
                XLSX_INDEX_FILE_NAME.to_string(),
            ]
        );
    }

    #[test]
    fn test_write_bundle_empty_run() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_bundle(temp_dir.path(), &[], &[]).unwrap();

        assert!(paths.csv.is_file());
        assert!(paths.xlsx.is_file());
        assert_eq!(paths.archived_documents, 0);
        assert_eq!(
            archive_names(&paths.archive),
            vec![CSV_INDEX_FILE_NAME.to_string(), XLSX_INDEX_FILE_NAME.to_string()]
        );
    }
}
