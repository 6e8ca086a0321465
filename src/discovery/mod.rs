//! Candidate extraction from the case listing and case pages.
//!
//! - [`CaseSource`] lists cases ([`DiscoveryMode`]) and reads case pages
//! - [`extract_candidates`] turns case page HTML into [`DocumentCandidate`]s
//! - [`is_asset_url`] / [`is_pdf_url`] decide which links are documents
//!
//! [`DocumentCandidate`]: crate::document::DocumentCandidate

mod asset;
mod case_page;
mod error;
mod listing;

pub use asset::{absolutize_url, has_asset_host, is_asset_host, is_asset_url, is_pdf_url};
pub use case_page::{display_date, extract_candidates};
pub use error::DiscoveryError;
pub use listing::{
    CaseSource, DEFAULT_BASE_URL, DiscoveryMode, MERGER_OUTCOME_TYPES, dedupe_cases,
    has_next_page, parse_finder_links,
};
