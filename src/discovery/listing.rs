//! Case discovery: which case pages to crawl.
//!
//! Two listing sources exist on the site. The search API answers the
//! "cases mentioning an initial enforcement order" question directly; the
//! finder pages list every merger case, optionally filtered by outcome, and
//! are paginated.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::case_page::{compile_static_selector, element_text, extract_candidates};
use super::error::DiscoveryError;
use crate::document::{CaseRef, DocumentCandidate};
use crate::download::RateLimiter;

/// Site root every case link is relative to.
pub const DEFAULT_BASE_URL: &str = "https://www.gov.uk";

const SEARCH_API_PATH: &str = "/api/search.json";
const FINDER_PATH: &str = "/cma-cases";
const CASE_PATH_PREFIX: &str = "/cma-cases/";

const IEO_QUERY: &str = "\"initial enforcement order\"";
const IEO_FINDER_KEYWORDS: &str = "initial enforcement order";
const CMA_CASE_FORMAT: &str = "cma_case";
const CMA_ORG_SLUG: &str = "competition-and-markets-authority";
const SEARCH_RESULT_COUNT: &str = "1500";

/// Safety stop for finder pagination.
const MAX_FINDER_PAGES: u32 = 500;

/// Outcome filters used by [`DiscoveryMode::AllMergerCasesWithOutcomes`].
pub const MERGER_OUTCOME_TYPES: [&str; 15] = [
    "markets-phase-1-no-enforcement-action",
    "markets-phase-1-undertakings-in-lieu-of-reference",
    "markets-phase-1-referral",
    "mergers-phase-1-clearance",
    "mergers-phase-1-clearance-with-undertakings-in-lieu",
    "mergers-phase-1-referral",
    "mergers-phase-1-found-not-to-qualify",
    "mergers-phase-1-public-interest-interventions",
    "markets-phase-2-clearance-no-adverse-effect-on-competition",
    "markets-phase-2-adverse-effect-on-competition-leading-to-remedies",
    "markets-phase-2-decision-to-dispense-with-procedural-obligations",
    "mergers-phase-2-clearance",
    "mergers-phase-2-clearance-with-remedies",
    "mergers-phase-2-prohibition",
    "mergers-phase-2-cancellation",
];

static FINDER_LINKS: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector("a.gem-c-document-list__item-title, .gem-c-document-list a")
});

/// Which cases to crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Cases the search API finds for "initial enforcement order".
    #[default]
    IeoQuery,
    /// Every merger case in the finder.
    AllMergerCases,
    /// Merger cases restricted to [`MERGER_OUTCOME_TYPES`].
    AllMergerCasesWithOutcomes,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<CaseRef>,
}

/// Reads case links from a finder page.
#[must_use]
pub fn parse_finder_links(html: &str) -> Vec<CaseRef> {
    let document = Html::parse_document(html);
    document
        .select(&FINDER_LINKS)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            href.starts_with(CASE_PATH_PREFIX)
                .then(|| CaseRef::new(element_text(&anchor), href))
        })
        .collect()
}

/// True if the page links to `page={page + 1}`.
#[must_use]
pub fn has_next_page(html: &str, page: u32) -> bool {
    html.contains(&format!("page={}", page + 1))
}

/// Drops cases without a link and repeated links, keeping first-seen order.
#[must_use]
pub fn dedupe_cases(cases: Vec<CaseRef>) -> Vec<CaseRef> {
    let mut seen = HashSet::new();
    cases
        .into_iter()
        .filter(|case| !case.link.is_empty() && seen.insert(case.link.clone()))
        .collect()
}

/// Listing and case-page reader bound to one site.
#[derive(Debug, Clone)]
pub struct CaseSource {
    client: Client,
    base_url: Url,
    limiter: Arc<RateLimiter>,
}

impl CaseSource {
    /// Creates a source reading from `base_url` (normally [`DEFAULT_BASE_URL`]).
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(
        client: Client,
        base_url: &str,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, DiscoveryError> {
        let base_url = Url::parse(base_url).map_err(|_| DiscoveryError::invalid_url(base_url))?;
        Ok(Self {
            client,
            base_url,
            limiter,
        })
    }

    /// Lists the cases for `mode`, de-duplicated by link.
    ///
    /// # Errors
    ///
    /// Returns an error if the first listing request fails.
    #[instrument(skip(self))]
    pub async fn discover(&self, mode: DiscoveryMode) -> Result<Vec<CaseRef>, DiscoveryError> {
        let cases = match mode {
            DiscoveryMode::IeoQuery => {
                let cases = self.search_ieo_cases().await?;
                if cases.is_empty() {
                    info!("search API returned no cases, falling back to finder keywords");
                    self.finder_cases(&[("keywords", IEO_FINDER_KEYWORDS)], false)
                        .await?
                } else {
                    cases
                }
            }
            DiscoveryMode::AllMergerCases => self.finder_cases(&[], true).await?,
            DiscoveryMode::AllMergerCasesWithOutcomes => {
                let filters: Vec<(&str, &str)> = MERGER_OUTCOME_TYPES
                    .iter()
                    .map(|outcome| ("outcome_type[]", *outcome))
                    .collect();
                self.finder_cases(&filters, true).await?
            }
        };
        let cases = dedupe_cases(cases);
        info!(count = cases.len(), "discovered cases");
        Ok(cases)
    }

    /// Queries the search API for cases mentioning an initial enforcement order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or malformed JSON.
    pub async fn search_ieo_cases(&self) -> Result<Vec<CaseRef>, DiscoveryError> {
        let mut url = self.join(SEARCH_API_PATH)?;
        url.query_pairs_mut()
            .append_pair("q", IEO_QUERY)
            .append_pair("filter_format", CMA_CASE_FORMAT)
            .append_pair("filter_organisations", CMA_ORG_SLUG)
            .append_pair("count", SEARCH_RESULT_COUNT)
            .append_pair("fields", "title,link,public_timestamp")
            .append_pair("order", "-public_timestamp");

        let body = self.get_text(&url).await?;
        let response: SearchResponse =
            serde_json::from_str(&body).map_err(|e| DiscoveryError::json(url.as_str(), e))?;
        debug!(count = response.results.len(), "search API results");
        Ok(dedupe_cases(response.results))
    }

    /// Collects merger cases from the finder, adding `filters` to the query.
    ///
    /// With `paginate`, follows `page=N` until a page no longer links to the
    /// next one. Later pages that fail end pagination with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the first page cannot be fetched.
    pub async fn finder_cases(
        &self,
        filters: &[(&str, &str)],
        paginate: bool,
    ) -> Result<Vec<CaseRef>, DiscoveryError> {
        let mut cases = Vec::new();
        let mut page = 1;
        loop {
            let mut url = self.join(FINDER_PATH)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("case_type[]", "mergers");
                for (key, value) in filters {
                    query.append_pair(key, value);
                }
                if paginate {
                    query.append_pair("page", &page.to_string());
                }
            }

            let html = match self.get_text(&url).await {
                Ok(html) => html,
                Err(e) if page > 1 => {
                    warn!(error = %e, page, "finder page failed, stopping pagination");
                    break;
                }
                Err(e) => return Err(e),
            };

            let found = parse_finder_links(&html);
            debug!(page, count = found.len(), "finder page");
            let empty = found.is_empty();
            cases.extend(found);

            if !paginate || empty || !has_next_page(&html, page) || page >= MAX_FINDER_PAGES {
                break;
            }
            page += 1;
        }
        Ok(cases)
    }

    /// Absolute URL of a case page.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidUrl`] if the link cannot be joined.
    pub fn case_url(&self, case: &CaseRef) -> Result<Url, DiscoveryError> {
        self.join(&case.link)
    }

    /// Fetches a case page and extracts its document candidates.
    ///
    /// Cases without a link yield no candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be fetched.
    #[instrument(skip(self, case), fields(case = %case.link))]
    pub async fn fetch_case_candidates(
        &self,
        case: &CaseRef,
    ) -> Result<Vec<DocumentCandidate>, DiscoveryError> {
        if case.link.trim().is_empty() {
            return Ok(Vec::new());
        }
        let url = self.case_url(case)?;
        let html = self.get_text(&url).await?;
        Ok(extract_candidates(case, &url, &html))
    }

    fn join(&self, path: &str) -> Result<Url, DiscoveryError> {
        self.base_url
            .join(path)
            .map_err(|_| DiscoveryError::invalid_url(path))
    }

    async fn get_text(&self, url: &Url) -> Result<String, DiscoveryError> {
        self.limiter.acquire(url.as_str()).await;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DiscoveryError::network(url.as_str(), e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::http_status(url.as_str(), status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| DiscoveryError::network(url.as_str(), e))
    }
}
