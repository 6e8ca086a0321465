//! Recognition of legitimate document-asset URLs.
//!
//! Case pages link to plenty of noise (navigation, other sites, HTML pages).
//! Only attachments served from the publishing asset hosts, or from the
//! legacy uploads path on the main site, count as documents.

use url::Url;

/// Hosts that serve uploaded attachments under any path.
const ASSET_HOSTS: &[&str] = &[
    "assets.publishing.service.gov.uk",
    "assets-origin.publishing.service.gov.uk",
    "assets.digital.cabinet-office.gov.uk",
];

/// Hosts that serve attachments only under [`LEGACY_UPLOAD_PREFIX`].
const SITE_HOSTS: &[&str] = &["www.gov.uk", "gov.uk"];

/// Path prefix of legacy uploads on the main site.
const LEGACY_UPLOAD_PREFIX: &str = "/government/uploads/";

/// Resolves a possibly relative link against the page it was found on.
///
/// Returns the value as-is if it already starts with `http://` or `https://`;
/// normalizes `//...` to `https:...`; otherwise joins with `base_url`.
/// Empty links resolve to nothing.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &Url) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    base_url.join(value).ok().map(|url| url.to_string())
}

/// Returns true if `host` is one of the dedicated asset hosts.
#[must_use]
pub fn is_asset_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    ASSET_HOSTS.contains(&host.as_str())
}

/// Returns true if the URL's host is one of the dedicated asset hosts.
#[must_use]
pub fn has_asset_host(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(is_asset_host))
        .unwrap_or(false)
}

/// Returns true if `url` points at an uploaded document.
///
/// Accepts absolute URLs on an asset host, absolute URLs on the main site
/// under the legacy uploads path, and site-relative legacy upload paths.
#[must_use]
pub fn is_asset_url(url: &str) -> bool {
    let url = url.trim();
    if url.starts_with('/') && !url.starts_with("//") {
        return url.starts_with(LEGACY_UPLOAD_PREFIX);
    }

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    if is_asset_host(host) {
        return true;
    }
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    SITE_HOSTS.contains(&host.as_str()) && parsed.path().starts_with(LEGACY_UPLOAD_PREFIX)
}

/// Returns true if the URL ends in `.pdf` (case-insensitive).
///
/// Links carrying a query string or fragment after the extension are rejected.
#[must_use]
pub fn is_pdf_url(url: &str) -> bool {
    url.trim().to_ascii_lowercase().ends_with(".pdf")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_asset_url_accepts_mirrors() {
        assert!(is_asset_url(
            "https://assets.digital.cabinet-office.gov.uk/government/uploads/system/uploads/attachment_data/file/123456/legacy-derogation.pdf"
        ));
        assert!(is_asset_url(
            "https://assets-origin.publishing.service.gov.uk/government/uploads/system/uploads/attachment_data/file/654321/file.pdf"
        ));
        assert!(is_asset_url(
            "https://assets.publishing.service.gov.uk/media/abc/derogation.pdf"
        ));
    }

    #[test]
    fn test_is_asset_url_main_site_only_under_uploads() {
        assert!(is_asset_url(
            "https://www.gov.uk/government/uploads/system/uploads/attachment_data/file/000001/file.pdf"
        ));
        assert!(is_asset_url(
            "https://www.gov.uk/government/uploads/system/file.pdf"
        ));
        assert!(is_asset_url(
            "/government/uploads/system/uploads/attachment_data/file/000001/file.pdf"
        ));
        assert!(!is_asset_url("https://www.gov.uk/government/news/file.pdf"));
        assert!(!is_asset_url("/cma-cases/example/file.pdf"));
    }

    #[test]
    fn test_is_asset_url_rejects_other_hosts() {
        assert!(!is_asset_url("https://example.com/file.pdf"));
        assert!(!is_asset_url(
            "https://malicious.publishing.service.gov.uk/file.pdf"
        ));
        assert!(!is_asset_url("ftp://assets.publishing.service.gov.uk/file.pdf"));
        assert!(!is_asset_url(""));
    }

    #[test]
    fn test_absolutize_url_variants() {
        let base = Url::parse("https://www.gov.uk/cma-cases/example").unwrap();
        assert_eq!(
            absolutize_url("//assets.publishing.service.gov.uk/a.pdf", &base).unwrap(),
            "https://assets.publishing.service.gov.uk/a.pdf"
        );
        assert_eq!(
            absolutize_url("/government/uploads/x.pdf", &base).unwrap(),
            "https://www.gov.uk/government/uploads/x.pdf"
        );
        assert_eq!(
            absolutize_url("http://example.com/a.pdf", &base).unwrap(),
            "http://example.com/a.pdf"
        );
        assert_eq!(absolutize_url("   ", &base), None);
    }

    #[test]
    fn test_is_pdf_url_requires_trailing_extension() {
        assert!(is_pdf_url("https://example.com/a/B.PDF"));
        assert!(!is_pdf_url("https://example.com/a/b.pdf?download=1"));
        assert!(!is_pdf_url("https://example.com/a/b.pdf#page=2"));
        assert!(!is_pdf_url("https://example.com/a/b.pdf.html"));
        assert!(!is_pdf_url("https://example.com/a/b.odt"));
    }

    #[test]
    fn test_has_asset_host() {
        assert!(has_asset_host(
            "https://assets.publishing.service.gov.uk/media/x/file.pdf"
        ));
        assert!(!has_asset_host("https://www.gov.uk/government/uploads/x.pdf"));
        assert!(!has_asset_host("not a url"));
    }
}
