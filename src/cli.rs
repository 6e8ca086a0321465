//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use casedocs_core::{DEFAULT_MAX_RETRIES, DiscoveryMode, DocumentFilter};

/// Collect and bundle the procedural documents published on CMA case pages.
///
/// Casedocs discovers cases, keeps the canonical initial enforcement orders,
/// derogations, revocations and decisions of each, stores them under
/// per-case folders and writes a CSV/JSON index plus a zip bundle.
#[derive(Parser, Debug)]
#[command(name = "casedocs")]
#[command(author, version, about)]
#[command(group(
    ArgGroup::new("mode")
        .args(["query_ieo_only", "all_merger_cases", "all_merger_cases_with_outcomes"])
))]
#[command(group(
    ArgGroup::new("category")
        .args(["only_derogations", "only_full_text_decisions"])
))]
pub struct Args {
    /// Output folder for downloads, index files and the archive
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Discover cases mentioning initial enforcement orders (default)
    #[arg(long)]
    pub query_ieo_only: bool,

    /// Crawl every merger case listed by the case finder
    #[arg(long)]
    pub all_merger_cases: bool,

    /// Crawl merger cases restricted to the known outcome types
    #[arg(long)]
    pub all_merger_cases_with_outcomes: bool,

    /// Stop after this many cases (0 for no limit)
    #[arg(long, default_value_t = 0)]
    pub max_cases: usize,

    /// Keep only derogations
    #[arg(long)]
    pub only_derogations: bool,

    /// Keep only full-text decisions
    #[arg(long)]
    pub only_full_text_decisions: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum retry attempts for transient failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// Minimum delay between requests to the same host in milliseconds (0 to disable, max 60000)
    #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: u64,
}

impl Args {
    /// Discovery mode selected by the mode flags.
    pub fn discovery_mode(&self) -> DiscoveryMode {
        if self.all_merger_cases_with_outcomes {
            DiscoveryMode::AllMergerCasesWithOutcomes
        } else if self.all_merger_cases {
            DiscoveryMode::AllMergerCases
        } else {
            DiscoveryMode::IeoQuery
        }
    }

    /// Category filter selected by the `--only-*` flags.
    pub fn document_filter(&self) -> DocumentFilter {
        if self.only_derogations {
            DocumentFilter::OnlyDerogations
        } else if self.only_full_text_decisions {
            DocumentFilter::OnlyFullTextDecisions
        } else {
            DocumentFilter::All
        }
    }
}
