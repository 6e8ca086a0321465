//! Per-case selection of which document variants to keep.
//!
//! A case page usually links several variants of related material: the full
//! order and a summary of it, a procedural decision and the full-text
//! decision, a provisional report and the final one. Selection runs over the
//! whole case group at once because some rules depend on the siblings.
//!
//! Rules are applied independently and the result is their union:
//!
//! | Rule | Retains |
//! |------|---------|
//! | Always include | procedural instruments that are not summary-like |
//! | Single document | a lone candidate, unless it is a summary of a procedural type |
//! | Final report | every non-summary final report |
//! | Provisional findings | the first non-summary provisional findings report, only without a final report |
//! | Full-text decision | decisions titled as full text, excluding procedural phrasings and summaries |
//! | Simple PDF | bare-filename PDFs, only when no substantive type exists in the case |

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::classify::compile_static_regex;
use crate::document::{ClassifiedCandidate, DocumentType};

/// Types retained whenever the title is not summary-like.
pub const ALWAYS_INCLUDE_TYPES: &[DocumentType] = &[
    DocumentType::InitialEnforcementOrder,
    DocumentType::Derogation,
    DocumentType::RevocationOrder,
    DocumentType::HoldSeparateManager,
    DocumentType::MonitoringTrustee,
    DocumentType::CommencementNotice,
];

/// Types whose lone summary-like document is dropped in a single-document case.
pub const SINGLE_DOC_PROCEDURAL_TYPES: &[DocumentType] = &[
    DocumentType::Derogation,
    DocumentType::InitialEnforcementOrder,
    DocumentType::RevocationOrder,
    DocumentType::CommencementNotice,
];

/// Types whose presence suppresses the bare-filename fallback.
pub const SUBSTANTIVE_TYPES: &[DocumentType] = &[
    DocumentType::Decision,
    DocumentType::FinalReport,
    DocumentType::ProvisionalFindings,
];

static SUMMARY_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"(?i)\bsummary of\b|\bexecutive summary\b|\bsummary\b.*\breport\b|\bnews release\b",
    )
});

static PROCEDURAL_DECISION: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r"(?i)\buil acceptance\b|\bdecision to refer\b|\bpenalty notice\b|\bnotice of\b",
    )
});

static PROVISIONAL_FINDINGS_REPORT: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)\bprovisional findings report\b"));

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"[^a-z0-9]+"));

const FULL_TEXT_PHRASES: &[&str] = &[
    "full text decision",
    "full text decisions",
    "full decision text",
    "full decision texts",
];

static FULL_TEXT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile_static_regex(r"\bfull text(?: [a-z0-9]+){0,4} decisions?\b"),
        compile_static_regex(r"\bfull decision(?: [a-z0-9]+){0,3} texts?\b"),
        compile_static_regex(r"\bdecision(?: [a-z0-9]+){0,3} full(?: [a-z0-9]+){0,3} texts?\b"),
    ]
});

/// Why a candidate was retained (first matching rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainReason {
    AlwaysInclude,
    SingleDocument,
    FinalReport,
    ProvisionalFindings,
    FullTextDecision,
    SimplePdfFallback,
}

/// Selection outcome for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionDecision {
    /// The rule that retained the candidate, if any.
    pub reason: Option<RetainReason>,
}

impl SelectionDecision {
    /// Returns true if the candidate is kept.
    #[must_use]
    pub fn retain(self) -> bool {
        self.reason.is_some()
    }

    fn mark(&mut self, reason: RetainReason) {
        if self.reason.is_none() {
            self.reason = Some(reason);
        }
    }
}

/// Returns true if the title reads like an abridged or secondary document.
#[must_use]
pub fn is_summary_like(title: &str) -> bool {
    SUMMARY_LIKE.is_match(title)
}

/// Returns true if the title names a procedural decision rather than the decision text.
#[must_use]
pub fn is_procedural_decision(title: &str) -> bool {
    PROCEDURAL_DECISION.is_match(title)
}

/// Lower-cases a title and collapses every non-alphanumeric run to one space.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_ALPHANUMERIC_RUN
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}

/// Returns true if the title names the full text of a decision.
///
/// Tolerates hyphenation and a few incidental words, so "Full-text decision"
/// and "Full text of the decision (final)" both match.
#[must_use]
pub fn is_full_text_decision(title: &str) -> bool {
    let normalized = normalize_title(title);
    if normalized.is_empty() {
        return false;
    }
    FULL_TEXT_PHRASES
        .iter()
        .any(|phrase| normalized.contains(phrase))
        || FULL_TEXT_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(&normalized))
}

/// Decides which candidates of one case are retained.
///
/// The returned vector is aligned with `candidates`. An empty group yields an
/// empty vector; the function never fails and is idempotent.
#[must_use]
pub fn select(candidates: &[ClassifiedCandidate]) -> Vec<SelectionDecision> {
    let mut decisions = vec![SelectionDecision::default(); candidates.len()];

    for (decision, item) in decisions.iter_mut().zip(candidates) {
        if ALWAYS_INCLUDE_TYPES.contains(&item.doc_type) && !is_summary_like(item.title()) {
            decision.mark(RetainReason::AlwaysInclude);
        }
    }

    if let ([item], [decision]) = (candidates, decisions.as_mut_slice())
        && !decision.retain()
    {
        let throwaway_summary = is_summary_like(item.title())
            && SINGLE_DOC_PROCEDURAL_TYPES.contains(&item.doc_type);
        if !throwaway_summary {
            decision.mark(RetainReason::SingleDocument);
        }
    }

    let mut has_final_report = false;
    for (decision, item) in decisions.iter_mut().zip(candidates) {
        if item.doc_type == DocumentType::FinalReport && !is_summary_like(item.title()) {
            decision.mark(RetainReason::FinalReport);
            has_final_report = true;
        }
    }

    if !has_final_report
        && let Some(index) = candidates.iter().position(|item| {
            item.doc_type == DocumentType::ProvisionalFindings
                && PROVISIONAL_FINDINGS_REPORT.is_match(item.title())
                && !is_summary_like(item.title())
        })
    {
        decisions[index].mark(RetainReason::ProvisionalFindings);
    }

    for (decision, item) in decisions.iter_mut().zip(candidates) {
        let title = item.title();
        if item.doc_type == DocumentType::Decision
            && is_full_text_decision(title)
            && !is_procedural_decision(title)
            && !is_summary_like(title)
        {
            decision.mark(RetainReason::FullTextDecision);
        }
    }

    let has_substantive = candidates
        .iter()
        .any(|item| SUBSTANTIVE_TYPES.contains(&item.doc_type));
    if !has_substantive {
        for (decision, item) in decisions.iter_mut().zip(candidates) {
            if item.doc_type == DocumentType::SimplePdf {
                decision.mark(RetainReason::SimplePdfFallback);
            }
        }
    }

    if let Some(first) = candidates.first() {
        debug!(
            case = %first.candidate.case_id,
            candidates = candidates.len(),
            retained = decisions.iter().filter(|d| d.retain()).count(),
            has_final_report,
            "selected case documents"
        );
    }

    decisions
}
