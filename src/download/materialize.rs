//! Idempotent, retry-safe persistence of one document.
//!
//! The document is streamed into `{path}.part` and renamed into place only
//! once a non-empty payload has been written, so a complete-looking file at
//! the final path always has content. A source record is written next to it.
//! A non-empty file already at the path is reused without fetching unless its
//! record names a different URL; a zero-byte file is an unfinished earlier
//! attempt and is overwritten. Nothing is ever deleted from the final path.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::client::DocumentFetcher;
use super::constants::PARTIAL_SUFFIX;
use super::error::DownloadError;
use super::rate_limiter::{RateLimiter, parse_retry_after};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use super::sidecar::{read_source, write_source};

/// What happened when materializing a document.
#[derive(Debug)]
pub enum MaterializeOutcome {
    /// Fetched during this call.
    Fetched {
        /// Size of the stored file.
        bytes: u64,
    },
    /// A complete file was already present; nothing was fetched.
    Reused {
        /// Size of the existing file.
        bytes: u64,
    },
    /// Not materialized. Nothing complete-looking was written to the target path.
    Failed {
        /// The last error seen.
        error: DownloadError,
    },
}

/// Result of materializing one document.
#[derive(Debug)]
pub struct MaterializationResult {
    /// Target path the document was (or would have been) stored at.
    pub path: PathBuf,
    /// Fetch attempts made (0 when an existing file was reused).
    pub attempts: u32,
    /// Outcome of the call.
    pub outcome: MaterializeOutcome,
}

impl MaterializationResult {
    /// True if a non-empty file for this document now exists at [`Self::path`].
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(
            self.outcome,
            MaterializeOutcome::Fetched { .. } | MaterializeOutcome::Reused { .. }
        )
    }

    /// Stored path, only when the document is present.
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        self.is_present().then_some(self.path.as_path())
    }

    /// Size of the stored file, 0 when not present.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        match self.outcome {
            MaterializeOutcome::Fetched { bytes } | MaterializeOutcome::Reused { bytes } => bytes,
            MaterializeOutcome::Failed { .. } => 0,
        }
    }

    /// The error when not present.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match &self.outcome {
            MaterializeOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Path of the temporary file used while `path` is being written.
#[must_use]
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

async fn existing_size(path: &Path) -> u64 {
    tokio::fs::metadata(path)
        .await
        .map(|meta| if meta.is_file() { meta.len() } else { 0 })
        .unwrap_or(0)
}

/// Materializes the document at `url` into `path`.
///
/// Never returns an error: every failure is reported in the outcome so a
/// batch can continue. Transient failures are retried according to `retry`;
/// each attempt first waits on `limiter` for the document host.
#[instrument(skip_all, fields(url = %url, path = %path.display()))]
pub async fn materialize(
    url: &str,
    path: &Path,
    fetcher: &dyn DocumentFetcher,
    retry: &RetryPolicy,
    limiter: &RateLimiter,
) -> MaterializationResult {
    let finish = |attempts: u32, outcome: MaterializeOutcome| MaterializationResult {
        path: path.to_path_buf(),
        attempts,
        outcome,
    };

    let existing = existing_size(path).await;
    if existing > 0 {
        if let Some(record) = read_source(path)
            && record.source_url != url
        {
            let error = DownloadError::occupied(path, record.source_url);
            warn!(error = %error, "target holds another document");
            return finish(0, MaterializeOutcome::Failed { error });
        }
        debug!(bytes = existing, "reusing existing file");
        return finish(0, MaterializeOutcome::Reused { bytes: existing });
    }

    if let Some(parent) = path.parent()
        && let Err(e) = tokio::fs::create_dir_all(parent).await
    {
        let error = DownloadError::io(parent, e);
        warn!(error = %error, "cannot create target directory");
        return finish(0, MaterializeOutcome::Failed { error });
    }

    let part = partial_path(path);
    let mut attempt = 1;
    loop {
        limiter.acquire(url).await;
        let error = match fetch_once(url, path, &part, fetcher).await {
            Ok(bytes) => {
                if let Err(e) = write_source(path, url) {
                    warn!(error = %e, "cannot write source record");
                }
                info!(bytes, attempt, "document stored");
                return finish(attempt, MaterializeOutcome::Fetched { bytes });
            }
            Err(error) => error,
        };

        let failure = classify_error(&error);
        match retry.should_retry(failure, attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next,
            } => {
                let delay = if failure == FailureType::RateLimited {
                    let server_delay = error
                        .retry_after()
                        .and_then(parse_retry_after)
                        .unwrap_or_default();
                    let delay = delay.max(server_delay);
                    limiter.record_rate_limit(url, delay);
                    delay
                } else {
                    delay
                };
                warn!(
                    error = %error,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt = next;
            }
            RetryDecision::DoNotRetry { reason } => {
                warn!(error = %error, attempt, reason = %reason, "document not materialized");
                return finish(attempt, MaterializeOutcome::Failed { error });
            }
        }
    }
}

/// One fetch into the partial file, renamed into place when non-empty.
async fn fetch_once(
    url: &str,
    path: &Path,
    part: &Path,
    fetcher: &dyn DocumentFetcher,
) -> Result<u64, DownloadError> {
    let result = fetcher.fetch_to_file(url, part).await;
    match result {
        Ok(bytes) if bytes > 0 => {
            if let Err(e) = tokio::fs::rename(part, path).await {
                let _ = tokio::fs::remove_file(part).await;
                return Err(DownloadError::io(path, e));
            }
            Ok(bytes)
        }
        Ok(_) => {
            let _ = tokio::fs::remove_file(part).await;
            Err(DownloadError::empty_body(url))
        }
        Err(error) => {
            let _ = tokio::fs::remove_file(part).await;
            Err(error)
        }
    }
}
