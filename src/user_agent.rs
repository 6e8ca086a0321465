//! User-Agent sent with every request.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/casedocs";

/// Default User-Agent for page and document requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("casedocs/{version} (case-document-archiver; +{PROJECT_UA_URL})")
}
