//! CLI entry point for the casedocs tool.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use casedocs_core::discovery::DEFAULT_BASE_URL;
use casedocs_core::{
    CaseRef, CaseSource, DocumentCandidate, HttpClient, PipelineConfig, RetryPolicy, pipeline,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!(out = %args.out.display(), "casedocs starting");

    let config = PipelineConfig {
        filter: args.document_filter(),
        politeness_delay: Duration::from_millis(args.delay_ms),
        retry: RetryPolicy::with_max_retries(u32::from(args.max_retries)),
        ..PipelineConfig::new(&args.out)
    };
    let limiter = Arc::new(config.rate_limiter());
    if limiter.is_disabled() {
        debug!("politeness delay disabled");
    }

    let client = HttpClient::new().context("failed to build HTTP client")?;
    let source = CaseSource::new(client.inner().clone(), DEFAULT_BASE_URL, Arc::clone(&limiter))?;

    let mut cases = source
        .discover(args.discovery_mode())
        .await
        .context("case discovery failed")?;
    if args.max_cases > 0 && cases.len() > args.max_cases {
        info!(limit = args.max_cases, "limiting case count");
        cases.truncate(args.max_cases);
    }

    let show_progress = !args.quiet && io::stderr().is_terminal();
    let candidates = crawl_cases(&source, &cases, show_progress).await;
    info!(
        cases = cases.len(),
        candidates = candidates.len(),
        "case pages crawled"
    );

    let report = pipeline::run(candidates, &client, &limiter, &config).await?;

    info!(
        retained = report.retained(),
        fetched = report.fetched,
        reused = report.reused,
        failed = report.failed,
        "bundle written"
    );
    if !args.quiet {
        println!("{}", report.paths.csv.display());
        println!("{}", report.paths.xlsx.display());
        println!("{}", report.paths.archive.display());
    }

    Ok(())
}

/// Reads every case page; a case that cannot be read is logged and skipped.
async fn crawl_cases(
    source: &CaseSource,
    cases: &[CaseRef],
    show_progress: bool,
) -> Vec<DocumentCandidate> {
    let progress = if show_progress {
        let bar = ProgressBar::new(cases.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let mut candidates = Vec::new();
    for case in cases {
        progress.set_message(case.title.clone());
        match source.fetch_case_candidates(case).await {
            Ok(found) => {
                debug!(case = %case.link, found = found.len(), "case page read");
                candidates.extend(found);
            }
            Err(error) => warn!(case = %case.link, error = %error, "skipping case"),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    candidates
}
