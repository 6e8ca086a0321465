//! Candidate extraction from a case page.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};
use url::Url;

use super::asset::{absolutize_url, is_asset_url, is_pdf_url};
use crate::classify::compile_static_regex;
use crate::document::{CaseRef, DocumentCandidate};

/// Trailing display date next to a link, e.g. `(9.9.25)` or `(10.8.2021)`.
static DISPLAY_DATE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"\((\d{1,2}\.\d{1,2}\.\d{2,4})\)$"));

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("a"));

/// Parses a CSS selector known at compile time.
///
/// # Panics
///
/// Panics if `selector` is not valid CSS, which is a programming error.
pub(crate) fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector)
        .unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e:?}"))
}

/// Whitespace-normalised text of an element.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads a trailing `(d.m.yy)` date from link text as `d/m/yy`.
#[must_use]
pub fn display_date(text: &str) -> Option<String> {
    DISPLAY_DATE
        .captures(text.trim_end())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace('.', "/"))
}

/// Extracts every PDF attachment link on a case page.
///
/// Links are resolved against `case_url`; only allow-listed asset URLs ending
/// in `.pdf` are kept. Duplicates are preserved in page order.
#[must_use]
pub fn extract_candidates(case: &CaseRef, case_url: &Url, html: &str) -> Vec<DocumentCandidate> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let href = anchor.value().attr("href").unwrap_or_default();
        let Some(url) = absolutize_url(href, case_url) else {
            continue;
        };
        if !is_asset_url(&url) || !is_pdf_url(&url) {
            trace!(url = %url, "skipping non-document link");
            continue;
        }

        let text = element_text(&anchor);
        let mut candidate = DocumentCandidate::new(case.case_id(), case.title.clone(), &text, url)
            .with_case_url(case_url.as_str());
        if let Some(date) = display_date(&text) {
            candidate = candidate.with_observed_date(date);
        }
        candidates.push(candidate);
    }

    debug!(case = %case.link, count = candidates.len(), "extracted candidates");
    candidates
}
