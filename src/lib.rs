//! Casedocs Core Library
//!
//! Collects the procedural documents published on CMA case pages, keeps the
//! canonical variant of each, stores them under a stable folder layout and
//! bundles them with an index.
//!
//! # Architecture
//!
//! - [`document`] - Record types for each stage (case, candidate, classified candidate)
//! - [`classify`] - Title/URL heuristics mapping a candidate to a [`DocumentType`]
//! - [`selection`] - Per-case retain policy
//! - [`layout`] - Slugs, case folders and collision-aware file paths
//! - [`download`] - HTTP fetching, retry, politeness and materialization
//! - [`discovery`] - Case listing and case page link extraction
//! - [`index`] - CSV/JSON index files and the zip bundle
//! - [`pipeline`] - The end-to-end run tying the above together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod discovery;
pub mod document;
pub mod download;
pub mod index;
pub mod layout;
pub mod pipeline;
pub mod selection;

#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use classify::classify;
pub use discovery::{CaseSource, DiscoveryError, DiscoveryMode, extract_candidates};
pub use document::{CaseId, CaseRef, ClassifiedCandidate, DocumentCandidate, DocumentType};
pub use download::{
    DEFAULT_MAX_RETRIES, DocumentFetcher, DownloadError, FailureType, HttpClient,
    MaterializationResult, MaterializeOutcome, RateLimiter, RetryDecision, RetryPolicy,
    classify_error, materialize,
};
pub use index::{BundlePaths, IndexError, IndexRow, NOT_DOWNLOADED_MARKER};
pub use layout::{StoredPath, assign_path, build_path};
pub use pipeline::{BundleReport, DocumentFilter, PipelineConfig, PipelineError};
pub use selection::{RetainReason, SelectionDecision, is_full_text_decision, select};
