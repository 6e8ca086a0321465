//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use casedocs_core::{DocumentCandidate, PipelineConfig, RetryPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

pub const PDF_BODY: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF";

/// Retry schedule without sleeps.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO, 2.0)
}

/// Config writing under `out_dir` with no politeness delay and fast retries.
pub fn test_config(out_dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        politeness_delay: Duration::ZERO,
        retry: fast_retry(3),
        ..PipelineConfig::new(out_dir)
    }
}

/// Candidate for the "Example Merger" case.
pub fn example_candidate(title: &str, url: &str) -> DocumentCandidate {
    DocumentCandidate::new("/cma-cases/example-merger", "Example Merger", title, url)
        .with_case_url("https://www.gov.uk/cma-cases/example-merger")
}

/// Responder that fails the first `fail_count` requests with 503, then returns 200 with body.
struct FlakyResponder {
    request_count: Arc<AtomicUsize>,
    fail_count: usize,
    success_body: Vec<u8>,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.request_count.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_count {
            ResponseTemplate::new(503).set_body_bytes(b"service unavailable".to_vec())
        } else {
            ResponseTemplate::new(200).set_body_bytes(self.success_body.clone())
        }
    }
}

/// Mounts a GET responder at `route` that fails `fail_count` times before succeeding.
///
/// Returns the shared request counter.
pub async fn mount_flaky_pdf(
    server: &MockServer,
    route: &str,
    fail_count: usize,
    success_body: &[u8],
) -> Arc<AtomicUsize> {
    let request_count = Arc::new(AtomicUsize::new(0));
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(FlakyResponder {
            request_count: Arc::clone(&request_count),
            fail_count,
            success_body: success_body.to_vec(),
        })
        .mount(server)
        .await;
    request_count
}
