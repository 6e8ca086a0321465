//! Per-host politeness delays.
//!
//! [`RateLimiter`] spaces consecutive requests to the same host by a fixed
//! delay. The first request to a host proceeds immediately, and requests to
//! different hosts never wait for each other. Case pages and document assets
//! live on different hosts, so crawling and downloading interleave without
//! slowing each other down.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use casedocs_core::download::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_millis(250));
//! limiter.acquire("https://www.gov.uk/cma-cases/a").await;
//! // waits ~250ms
//! limiter.acquire("https://www.gov.uk/cma-cases/b").await;
//! // different host, no wait
//! limiter.acquire("https://assets.publishing.service.gov.uk/a.pdf").await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::constants::{CUMULATIVE_DELAY_WARNING_THRESHOLD, MAX_RETRY_AFTER};

/// Per-host request spacing shared by discovery and downloads.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    hosts: DashMap<String, Arc<HostState>>,
}

#[derive(Debug)]
struct HostState {
    last_request: Mutex<Option<Instant>>,
    cumulative_delay_ms: AtomicU64,
}

impl HostState {
    fn new() -> Self {
        Self {
            last_request: Mutex::new(None),
            cumulative_delay_ms: AtomicU64::new(0),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

impl RateLimiter {
    /// Creates a limiter spacing same-host requests by `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        debug!(delay_ms = delay.as_millis(), "creating rate limiter");
        Self {
            delay,
            hosts: DashMap::new(),
        }
    }

    /// Creates a limiter that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns true if this limiter never delays.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.delay.is_zero()
    }

    /// Configured delay between requests to one host.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until a request to the host of `url` is allowed, then records it.
    #[instrument(skip(self), fields(host))]
    pub async fn acquire(&self, url: &str) {
        if self.is_disabled() {
            return;
        }

        let host = extract_host(url);
        tracing::Span::current().record("host", host.as_str());

        // Clone the Arc so the map shard lock is released before awaiting.
        let state = self
            .hosts
            .entry(host.clone())
            .or_insert_with(|| Arc::new(HostState::new()))
            .clone();

        let mut last_request = state.last_request.lock().await;
        if let Some(previous) = *last_request {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                let wait = self.delay.saturating_sub(elapsed);
                let cumulative = state.add_cumulative_delay(wait);
                debug!(
                    host = %host,
                    delay_ms = wait.as_millis(),
                    cumulative_ms = cumulative.as_millis(),
                    "applying politeness delay"
                );
                warn_if_excessive(&host, cumulative);
                tokio::time::sleep(wait).await;
            }
        }
        *last_request = Some(Instant::now());
    }

    /// Records a delay the server asked for (429 with Retry-After).
    pub fn record_rate_limit(&self, url: &str, delay: Duration) {
        let host = extract_host(url);
        let state = self
            .hosts
            .entry(host.clone())
            .or_insert_with(|| Arc::new(HostState::new()))
            .clone();
        let cumulative = state.add_cumulative_delay(delay);
        debug!(
            host = %host,
            delay_ms = delay.as_millis(),
            cumulative_ms = cumulative.as_millis(),
            "recorded server rate limit"
        );
        warn_if_excessive(&host, cumulative);
    }
}

fn warn_if_excessive(host: &str, cumulative: Duration) {
    if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
        warn!(
            host = %host,
            cumulative_delay_secs = cumulative.as_secs(),
            "excessive rate limiting - consider a smaller run"
        );
    }
}

/// Lower-cased host of `url`, or `"unknown"` for unparseable input.
#[must_use]
pub fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Parses a Retry-After value (delta-seconds or HTTP-date), capped at one hour.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        let seconds = u64::try_from(seconds).ok()?;
        return Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER));
    }

    let datetime = httpdate::parse_http_date(header_value).ok()?;
    let duration = datetime
        .duration_since(std::time::SystemTime::now())
        .unwrap_or(Duration::ZERO);
    Some(duration.min(MAX_RETRY_AFTER))
}
