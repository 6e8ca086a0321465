//! Document type classification.
//!
//! Attachments are published with free-text link labels, so the type is
//! inferred from layered heuristics: a bare-filename check, then title
//! phrases, then URL keywords, then composite title keywords. Each layer is an
//! ordered rule table and the first matching rule wins.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::discovery::has_asset_host;
use crate::document::DocumentType;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Title phrases, highest priority first.
const TITLE_RULES: &[(&str, DocumentType)] = &[
    (r"(?i)\bfinal report\b", DocumentType::FinalReport),
    (
        r"(?i)\bprovisional findings report\b",
        DocumentType::ProvisionalFindings,
    ),
    (
        r"(?i)\binitial enforcement order\b",
        DocumentType::InitialEnforcementOrder,
    ),
    (r"(?i)\bieo\b", DocumentType::InitialEnforcementOrder),
    (r"(?i)\brevocation\b", DocumentType::RevocationOrder),
    (r"(?i)\bderogation\b", DocumentType::Derogation),
    (r"(?i)\bconsent\b", DocumentType::Derogation),
    (
        r"(?i)hold[-\s]?separate manager",
        DocumentType::HoldSeparateManager,
    ),
    (r"(?i)monitoring trustee", DocumentType::MonitoringTrustee),
    (r"(?i)commencement", DocumentType::CommencementNotice),
    (r"(?i)decision", DocumentType::Decision),
];

static COMPILED_TITLE_RULES: LazyLock<Vec<(Regex, DocumentType)>> = LazyLock::new(|| {
    TITLE_RULES
        .iter()
        .map(|(pattern, doc_type)| (compile_static_regex(pattern), *doc_type))
        .collect()
});

/// A title made only of a bare PDF filename carries no semantic signal.
static BARE_PDF_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)^[A-Za-z0-9_-]+\.pdf$"));

/// Keyword test against a lower-cased haystack.
#[derive(Debug, Clone, Copy)]
enum Keywords {
    AnyOf(&'static [&'static str]),
    AllOf(&'static [&'static str]),
}

impl Keywords {
    fn matches(self, haystack: &str) -> bool {
        match self {
            Self::AnyOf(words) => words.iter().any(|w| haystack.contains(w)),
            Self::AllOf(words) => words.iter().all(|w| haystack.contains(w)),
        }
    }
}

/// URL keyword hints, used when no title phrase matched.
const URL_RULES: &[(Keywords, DocumentType)] = &[
    (
        Keywords::AnyOf(&[
            "initial-enforcement-order",
            "initial_enforcement_order",
            "ieo",
        ]),
        DocumentType::InitialEnforcementOrder,
    ),
    (
        Keywords::AnyOf(&["derogation", "consent"]),
        DocumentType::Derogation,
    ),
    (
        Keywords::AnyOf(&["revocation"]),
        DocumentType::RevocationOrder,
    ),
    (
        Keywords::AllOf(&["hold", "separate", "manager"]),
        DocumentType::HoldSeparateManager,
    ),
    (
        Keywords::AllOf(&["monitoring", "trustee"]),
        DocumentType::MonitoringTrustee,
    ),
    (
        Keywords::AllOf(&["commencement", "notice"]),
        DocumentType::CommencementNotice,
    ),
    (Keywords::AnyOf(&["decision"]), DocumentType::Decision),
];

/// Composite keyword fallbacks against the lower-cased title.
const TITLE_FALLBACK_RULES: &[(Keywords, DocumentType)] = &[
    (
        Keywords::AllOf(&["order", "enforcement"]),
        DocumentType::InitialEnforcementOrder,
    ),
    (
        Keywords::AllOf(&["hold", "separate", "manager"]),
        DocumentType::HoldSeparateManager,
    ),
    (
        Keywords::AllOf(&["monitoring", "trustee"]),
        DocumentType::MonitoringTrustee,
    ),
    (
        Keywords::AllOf(&["commencement", "notice"]),
        DocumentType::CommencementNotice,
    ),
    (Keywords::AnyOf(&["decision"]), DocumentType::Decision),
];

fn first_keyword_match(rules: &[(Keywords, DocumentType)], haystack: &str) -> Option<DocumentType> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.matches(haystack))
        .map(|(_, doc_type)| *doc_type)
}

/// Returns true if `title` is nothing but a bare `name.pdf` filename.
#[must_use]
pub fn is_bare_pdf_filename(title: &str) -> bool {
    BARE_PDF_FILENAME.is_match(title.trim())
}

/// Returns the document type of an attachment from its link text and URL.
///
/// Total and deterministic: every input maps to exactly one type, with
/// [`DocumentType::Other`] when no rule applies.
#[must_use]
pub fn classify(title: &str, url: &str) -> DocumentType {
    let doc_type = classify_inner(title, url);
    trace!(title, url, doc_type = %doc_type, "classified attachment");
    doc_type
}

fn classify_inner(title: &str, url: &str) -> DocumentType {
    if is_bare_pdf_filename(title) && has_asset_host(url) {
        return DocumentType::SimplePdf;
    }

    if let Some((_, doc_type)) = COMPILED_TITLE_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(title))
    {
        return *doc_type;
    }

    if let Some(doc_type) = first_keyword_match(URL_RULES, &url.to_lowercase()) {
        return doc_type;
    }

    first_keyword_match(TITLE_FALLBACK_RULES, &title.to_lowercase())
        .unwrap_or(DocumentType::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: &str = "https://assets.publishing.service.gov.uk/media/abc/file.pdf";

    #[test]
    fn test_classify_empty_inputs_is_other() {
        assert_eq!(classify("", ""), DocumentType::Other);
    }

    #[test]
    fn test_classify_title_rules() {
        let cases = [
            ("Final report", DocumentType::FinalReport),
            (
                "Provisional findings report",
                DocumentType::ProvisionalFindings,
            ),
            (
                "Initial enforcement order",
                DocumentType::InitialEnforcementOrder,
            ),
            ("IEO (9.9.25)", DocumentType::InitialEnforcementOrder),
            ("Revocation of the order", DocumentType::RevocationOrder),
            ("Derogation (01.01.2023)", DocumentType::Derogation),
            ("Consent to appoint", DocumentType::Derogation),
            (
                "Hold-separate manager appointment",
                DocumentType::HoldSeparateManager,
            ),
            (
                "Holdseparate manager appointment",
                DocumentType::HoldSeparateManager,
            ),
            (
                "Appointment of monitoring trustee",
                DocumentType::MonitoringTrustee,
            ),
            (
                "Commencement of phase 1",
                DocumentType::CommencementNotice,
            ),
            ("Phase 1 decision", DocumentType::Decision),
        ];
        for (title, expected) in cases {
            assert_eq!(classify(title, ""), expected, "title: {title}");
        }
    }

    #[test]
    fn test_classify_final_report_beats_decision() {
        assert_eq!(
            classify("Final report and decision", ""),
            DocumentType::FinalReport
        );
    }

    #[test]
    fn test_classify_ieo_requires_word_boundary_in_title() {
        // "Pieology" contains "ieo" but not as a word; the URL carries no hint either.
        assert_eq!(
            classify("Pieology notes", "https://example.com/a.pdf"),
            DocumentType::Other
        );
    }

    #[test]
    fn test_classify_url_fallback() {
        let cases = [
            (
                "https://x.test/initial_enforcement_order.pdf",
                DocumentType::InitialEnforcementOrder,
            ),
            ("https://x.test/ieo-final.pdf", DocumentType::InitialEnforcementOrder),
            ("https://x.test/Consent-letter.pdf", DocumentType::Derogation),
            ("https://x.test/revocation.pdf", DocumentType::RevocationOrder),
            (
                "https://x.test/hold_separate_manager.pdf",
                DocumentType::HoldSeparateManager,
            ),
            (
                "https://x.test/monitoring-trustee.pdf",
                DocumentType::MonitoringTrustee,
            ),
            (
                "https://x.test/commencement-notice.pdf",
                DocumentType::CommencementNotice,
            ),
            ("https://x.test/Decision.pdf", DocumentType::Decision),
        ];
        for (url, expected) in cases {
            assert_eq!(classify("Untitled", url), expected, "url: {url}");
        }
    }

    #[test]
    fn test_classify_url_commencement_needs_notice() {
        assert_eq!(
            classify("Untitled", "https://x.test/commencement.pdf"),
            DocumentType::Other
        );
    }

    #[test]
    fn test_classify_composite_title_fallback() {
        assert_eq!(
            classify("Order under enforcement powers", "https://x.test/a.pdf"),
            DocumentType::InitialEnforcementOrder
        );
        assert_eq!(
            classify("Separate manager to hold", "https://x.test/a.pdf"),
            DocumentType::HoldSeparateManager
        );
        assert_eq!(
            classify("Trustee for monitoring", "https://x.test/a.pdf"),
            DocumentType::MonitoringTrustee
        );
    }

    #[test]
    fn test_classify_bare_filename_on_asset_host_is_simple_pdf() {
        assert_eq!(classify("report_2023-final.PDF", ASSET), DocumentType::SimplePdf);
        assert_eq!(classify("  abc.pdf  ", ASSET), DocumentType::SimplePdf);
    }

    #[test]
    fn test_classify_bare_filename_elsewhere_uses_other_rules() {
        assert_eq!(
            classify("decision.pdf", "https://example.com/decision.pdf"),
            DocumentType::Decision
        );
        assert_eq!(
            classify("file.pdf", "https://example.com/file.pdf"),
            DocumentType::Other
        );
    }

    #[test]
    fn test_classify_bare_filename_beats_title_rules() {
        assert_eq!(classify("decision.pdf", ASSET), DocumentType::SimplePdf);
    }

    #[test]
    fn test_is_bare_pdf_filename_rejects_spaces_and_other_extensions() {
        assert!(!is_bare_pdf_filename("final report.pdf"));
        assert!(!is_bare_pdf_filename("file.docx"));
        assert!(!is_bare_pdf_filename(".pdf"));
    }

    #[test]
    fn test_classify_is_deterministic() {
        let first = classify("Notice of revocation", ASSET);
        let second = classify("Notice of revocation", ASSET);
        assert_eq!(first, second);
    }
}
