//! End-to-end run over discovered candidates.
//!
//! dedupe by URL → classify → group by case → select → filter → assign path →
//! materialize → index and archive. Candidates are processed one at a time;
//! politeness between requests comes from the shared [`RateLimiter`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::document::{CaseId, ClassifiedCandidate, DocumentCandidate, DocumentType};
use crate::download::constants::DEFAULT_POLITENESS_DELAY;
use crate::download::{DocumentFetcher, MaterializeOutcome, RateLimiter, RetryPolicy, materialize};
use crate::index::{ArchiveEntry, BundlePaths, IndexError, IndexRow, sort_rows, write_bundle};
use crate::layout::assign_path;
use crate::selection::{is_full_text_decision, select};

/// Folder under the output directory that holds stored documents.
pub const DOWNLOADS_DIR_NAME: &str = "downloads";

/// Category restriction applied after selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Keep every retained document.
    #[default]
    All,
    /// Keep only derogations.
    OnlyDerogations,
    /// Keep only decisions whose title reads as a full-text decision.
    OnlyFullTextDecisions,
}

impl DocumentFilter {
    /// Returns true if `item` passes the filter.
    #[must_use]
    pub fn accepts(self, item: &ClassifiedCandidate) -> bool {
        match self {
            Self::All => true,
            Self::OnlyDerogations => item.doc_type == DocumentType::Derogation,
            Self::OnlyFullTextDecisions => {
                item.doc_type == DocumentType::Decision && is_full_text_decision(item.title())
            }
        }
    }
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root for downloads, index files and the archive.
    pub out_dir: PathBuf,
    pub filter: DocumentFilter,
    /// Minimum spacing between requests to one host.
    pub politeness_delay: Duration,
    /// Retry policy for each document fetch.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            filter: DocumentFilter::All,
            politeness_delay: DEFAULT_POLITENESS_DELAY,
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Default settings writing under `out_dir`.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    /// Folder that receives stored documents.
    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.out_dir.join(DOWNLOADS_DIR_NAME)
    }

    /// Builds the per-host limiter for `politeness_delay`.
    #[must_use]
    pub fn rate_limiter(&self) -> RateLimiter {
        if self.politeness_delay.is_zero() {
            RateLimiter::disabled()
        } else {
            RateLimiter::new(self.politeness_delay)
        }
    }
}

/// Errors that abort a run. Per-document failures never do.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The output directories could not be created.
    #[error("cannot create output directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the index or archive failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct BundleReport {
    /// Index rows as written, sorted.
    pub rows: Vec<IndexRow>,
    /// Files written.
    pub paths: BundlePaths,
    /// Documents fetched during this run.
    pub fetched: usize,
    /// Documents already present from an earlier run.
    pub reused: usize,
    /// Documents not materialized.
    pub failed: usize,
}

impl BundleReport {
    /// Number of retained documents (one row each).
    #[must_use]
    pub fn retained(&self) -> usize {
        self.rows.len()
    }
}

/// Drops repeated source URLs, keeping the first occurrence.
#[must_use]
pub fn dedupe_candidates(candidates: Vec<DocumentCandidate>) -> Vec<DocumentCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.source_url.clone()))
        .collect()
}

/// Groups candidates by case, cases and members in first-seen order.
#[must_use]
pub fn group_by_case(candidates: Vec<ClassifiedCandidate>) -> Vec<Vec<ClassifiedCandidate>> {
    let mut positions: HashMap<CaseId, usize> = HashMap::new();
    let mut groups: Vec<Vec<ClassifiedCandidate>> = Vec::new();
    for candidate in candidates {
        let case_id = candidate.candidate.case_id.clone();
        let index = *positions.entry(case_id).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[index].push(candidate);
    }
    groups
}

/// Runs the pure part of the pipeline: which documents to store, in order.
#[must_use]
pub fn plan(candidates: Vec<DocumentCandidate>, filter: DocumentFilter) -> Vec<ClassifiedCandidate> {
    let unique = dedupe_candidates(candidates);
    let classified: Vec<ClassifiedCandidate> =
        unique.into_iter().map(ClassifiedCandidate::classify).collect();

    let mut retained = Vec::new();
    for group in group_by_case(classified) {
        let decisions = select(&group);
        retained.extend(
            group
                .into_iter()
                .zip(decisions)
                .filter(|(item, decision)| decision.retain() && filter.accepts(item))
                .map(|(item, _)| item),
        );
    }
    debug!(retained = retained.len(), "planned documents");
    retained
}

fn index_row(item: &ClassifiedCandidate) -> IndexRow {
    let candidate = &item.candidate;
    IndexRow {
        case_title: candidate.case_title.clone(),
        case_url: candidate.case_url.clone(),
        case_path: candidate.case_id.to_string(),
        doc_type: item.doc_type.label().to_string(),
        doc_title: candidate.title.clone(),
        doc_date_display: candidate.observed_date.clone().unwrap_or_default(),
        doc_url: candidate.source_url.clone(),
        ..IndexRow::default()
    }
}

fn create_dir(path: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Archive case folders handed out so far.
///
/// Long case paths can truncate to the same slug; the later case gets a
/// numeric suffix so entry names stay unique within the archive.
#[derive(Debug, Default)]
struct ArchiveDirs {
    by_case: HashMap<CaseId, String>,
    claimed: HashSet<String>,
}

impl ArchiveDirs {
    fn claim(&mut self, case_id: &CaseId, base: &str) -> String {
        if let Some(dir) = self.by_case.get(case_id) {
            return dir.clone();
        }
        let mut dir = base.to_string();
        let mut suffix = 2;
        while self.claimed.contains(&dir) {
            dir = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.claimed.insert(dir.clone());
        self.by_case.insert(case_id.clone(), dir.clone());
        dir
    }
}

/// Stores the retained documents and writes the index files and archive.
///
/// # Errors
///
/// Returns an error only if the output directories cannot be created or the
/// index/archive cannot be written. Failed downloads are reported in the rows.
#[instrument(skip_all, fields(out_dir = %config.out_dir.display()))]
pub async fn run(
    candidates: Vec<DocumentCandidate>,
    fetcher: &dyn DocumentFetcher,
    limiter: &RateLimiter,
    config: &PipelineConfig,
) -> Result<BundleReport, PipelineError> {
    let downloads_dir = config.downloads_dir();
    create_dir(&config.out_dir)?;
    create_dir(&downloads_dir)?;

    let retained = plan(candidates, config.filter);
    info!(documents = retained.len(), "storing retained documents");

    let mut assigned: HashSet<PathBuf> = HashSet::new();
    let mut archive_dirs = ArchiveDirs::default();
    let mut rows = Vec::with_capacity(retained.len());
    let mut entries = Vec::new();
    let (mut fetched, mut reused, mut failed) = (0, 0, 0);

    for item in &retained {
        let candidate = &item.candidate;
        let stored = assign_path(
            &downloads_dir,
            &candidate.case_title,
            candidate.case_id.as_str(),
            item.doc_type,
            &candidate.title,
            &candidate.source_url,
            &assigned,
        );
        let target = stored.resolve(&downloads_dir);
        assigned.insert(target.clone());

        let result = materialize(
            &candidate.source_url,
            &target,
            fetcher,
            &config.retry,
            limiter,
        )
        .await;

        match &result.outcome {
            MaterializeOutcome::Fetched { .. } => fetched += 1,
            MaterializeOutcome::Reused { .. } => reused += 1,
            MaterializeOutcome::Failed { error } => {
                failed += 1;
                warn!(url = %candidate.source_url, error = %error, "document not downloaded");
            }
        }

        if result.is_present() {
            let mut stored = stored;
            stored.archive_case_dir =
                archive_dirs.claim(&candidate.case_id, &stored.archive_case_dir);
            entries.push(ArchiveEntry {
                source: target.clone(),
                name: stored.archive_name(),
            });
        }
        rows.push(index_row(item).with_local_path(result.local_path()));
    }

    sort_rows(&mut rows);
    let paths = write_bundle(&config.out_dir, &rows, &entries)?;

    info!(
        retained = rows.len(),
        fetched, reused, failed, "run complete"
    );
    Ok(BundleReport {
        rows,
        paths,
        fetched,
        reused,
        failed,
    })
}
