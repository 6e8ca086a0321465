//! Fetching and persisting documents.
//!
//! - [`HttpClient`] streams responses to disk and implements [`DocumentFetcher`]
//! - [`RetryPolicy`] / [`classify_error`] decide whether a failure is worth retrying
//! - [`RateLimiter`] spaces requests to the same host
//! - [`materialize`] combines them into the idempotent, retry-safe store step
//! - [`sidecar`] records which URL each stored file came from
//!
//! # Example
//!
//! ```no_run
//! use casedocs_core::download::{HttpClient, RateLimiter, RetryPolicy, materialize};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let limiter = RateLimiter::new(Duration::from_millis(250));
//! let result = materialize(
//!     "https://assets.publishing.service.gov.uk/media/x/order.pdf",
//!     Path::new("./downloads/order.pdf"),
//!     &client,
//!     &RetryPolicy::default(),
//!     &limiter,
//! )
//! .await;
//! println!("present: {}", result.is_present());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod materialize;
pub mod rate_limiter;
mod retry;
pub mod sidecar;

pub use client::{DocumentFetcher, HttpClient};
pub use error::DownloadError;
pub use materialize::{MaterializationResult, MaterializeOutcome, materialize, partial_path};
pub use rate_limiter::{RateLimiter, extract_host, parse_retry_after};
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, MAX_RETRIES_LIMIT, RetryDecision, RetryPolicy,
    classify_error,
};
pub use sidecar::{SourceRecord, is_held_by_other, read_source, write_source};
