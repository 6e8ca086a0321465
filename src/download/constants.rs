//! Constants for the download module (timeouts, rate limiting, retries).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout for document bodies (2 minutes).
pub const READ_TIMEOUT_SECS: u64 = 120;

/// Default pause between requests to the same host.
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_millis(250);

/// Warning threshold for cumulative rate limit delay per host (30 seconds).
pub const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Maximum Retry-After header value honoured (1 hour).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Suffix of the temporary file a document is streamed into before rename.
pub const PARTIAL_SUFFIX: &str = ".part";
