//! Crawler module for profile harvesting
//!
//! This module contains the core crawling logic, including:
//! - Retry with exponential backoff for navigation
//! - Randomized pacing between browser actions
//! - Infinite-scroll pagination
//! - The per-profile crawl session

mod pagination;
mod rate_limit;
mod retry;
mod session;

pub use pagination::{PaginationController, StopReason, STALL_LIMIT};
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
pub use session::{CrawlOutcome, CrawlSession};

use crate::browser::{BrowserLauncher, ChromeLauncher};
use crate::config::Config;
use crate::output::{log_statistics, CsvSink, ResultSink};
use crate::state::Deduplicator;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs a complete harvest with a real browser
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the CSV output and, in append mode, reload committed URLs
/// 2. Launch the browser and crawl the configured profile
/// 3. Save every committed record, even when the crawl was interrupted
/// 4. Log summary statistics
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `cancel` - Fires when the user asks to stop
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl completed
/// * `Err(HarvestError)` - Crawl failed
pub async fn crawl(config: &Config, cancel: CancellationToken) -> Result<CrawlOutcome, HarvestError> {
    crawl_with(config, &ChromeLauncher::new(), cancel).await
}

/// Same as [`crawl`] with an explicit browser backend
pub async fn crawl_with(
    config: &Config,
    launcher: &dyn BrowserLauncher,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, HarvestError> {
    let username = config.target.handle().to_string();

    info!("Starting harvest of @{}", username);
    info!(
        max_items = config.crawl.max_items,
        headless = config.browser.headless,
        output = %config.output.csv_path().display(),
        append = config.output.append,
        "Harvest configuration"
    );

    let mut sink = CsvSink::new(&config.output);

    let dedup = if config.output.append {
        let existing = sink.load_existing()?;
        if !existing.is_empty() {
            info!("Resuming: {} records already in {}", existing.len(), sink.path().display());
        }
        Deduplicator::from_urls(existing.into_iter().map(|record| record.url))
    } else {
        Deduplicator::new()
    };

    let result = CrawlSession::new(config, launcher, &mut sink)
        .with_deduplicator(dedup)
        .with_cancellation(cancel)
        .run(&username)
        .await;

    // Whatever was committed before a failure is still worth keeping
    let saved = if sink.is_empty() {
        warn!("No records to save");
        Ok(())
    } else {
        sink.save().map(|_| ())
    };

    log_statistics(&sink.stats());

    match (result, saved) {
        (Ok(outcome), Ok(())) => Ok(outcome),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(save_error)) => {
            error!("Failed to save partial results: {}", save_error);
            Err(e)
        }
    }
}
