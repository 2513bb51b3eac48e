//! Crawl session - profile harvest orchestration
//!
//! A session owns the browser for the duration of one run and sequences:
//! - Navigation to the profile (retried, fatal on failure)
//! - Pagination until enough items are visible
//! - Per-item extraction: grid fields, detail view, return to the grid
//! - Handing each record to the sink and committing its URL
//!
//! Per-item problems never end the session: an unreachable detail view
//! yields a record with grid fields only, and losing the profile page ends
//! the item loop with the records committed so far. The browser is released
//! on every exit path, including errors and cancellation.

use crate::browser::{BrowserLauncher, BrowserPage};
use crate::config::Config;
use crate::crawler::pagination::PaginationController;
use crate::crawler::rate_limit::RateLimiter;
use crate::crawler::retry::RetryPolicy;
use crate::extract::{enumerate_items, extract_detail, extract_listing};
use crate::output::ResultSink;
use crate::record::{DetailFields, ListingFields, VideoRecord};
use crate::state::{Deduplicator, ItemState, ItemTally};
use crate::url::profile_url;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Aggregate result of one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// True when at least one record was committed
    pub success: bool,

    pub records_committed: usize,

    /// Items visible when pagination finished
    pub items_loaded: usize,

    pub duplicates_skipped: usize,

    /// Items without a usable URL
    pub items_dropped: usize,

    /// Committed records whose detail view was unreachable
    pub details_missing: usize,

    /// Items the sink rejected
    pub items_failed: usize,

    /// Grid positions visited by the item loop
    pub items_visited: usize,

    /// The item loop stopped early because the profile could not be restored
    pub profile_lost: bool,
}

impl CrawlOutcome {
    fn from_tally(items_loaded: usize, tally: ItemTally, profile_lost: bool) -> Self {
        Self {
            success: tally.committed > 0,
            records_committed: tally.committed,
            items_loaded,
            duplicates_skipped: tally.duplicates,
            items_dropped: tally.dropped,
            details_missing: tally.partial,
            items_failed: tally.failed,
            items_visited: tally.visited(),
            profile_lost,
        }
    }
}

/// Where the page is after an item was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Profile,
    Lost,
}

/// One harvest of one profile
pub struct CrawlSession<'a> {
    config: &'a Config,
    launcher: &'a dyn BrowserLauncher,
    sink: &'a mut dyn ResultSink,
    dedup: Deduplicator,
    cancel: CancellationToken,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl<'a> CrawlSession<'a> {
    /// Creates a session
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `launcher` - Starts the browser when the session runs
    /// * `sink` - Receives every committed record
    pub fn new(
        config: &'a Config,
        launcher: &'a dyn BrowserLauncher,
        sink: &'a mut dyn ResultSink,
    ) -> Self {
        Self {
            config,
            launcher,
            sink,
            dedup: Deduplicator::new(),
            cancel: CancellationToken::new(),
            retry: RetryPolicy::from_config(&config.crawl),
            limiter: RateLimiter::from_config(&config.rate_limit),
        }
    }

    /// Starts from URLs committed by an earlier run
    pub fn with_deduplicator(mut self, dedup: Deduplicator) -> Self {
        self.dedup = dedup;
        self
    }

    /// Stops the session when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Harvests the profile `username`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The crawl ran to completion; `success` tells
    ///   whether anything was committed
    /// * `Err(HarvestError)` - Browser launch or profile navigation failed,
    ///   the profile does not exist or shows no items, or the run was cancelled
    pub async fn run(&mut self, username: &str) -> Result<CrawlOutcome, HarvestError> {
        let handle = username.trim().trim_start_matches('@').to_string();

        let session = self.launcher.launch(self.config).await?;

        let cancel = self.cancel.clone();
        let result = {
            let page = session.page();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Cancellation requested, stopping crawl");
                    Err(HarvestError::Interrupted)
                }
                result = self.crawl(page, &handle) => result,
            }
        };

        if let Err(e) = session.close().await {
            warn!("Failed to release browser: {}", e);
        }

        match &result {
            Ok(outcome) if outcome.success => info!(
                committed = outcome.records_committed,
                visited = outcome.items_visited,
                duplicates = outcome.duplicates_skipped,
                dropped = outcome.items_dropped,
                details_missing = outcome.details_missing,
                failed = outcome.items_failed,
                profile_lost = outcome.profile_lost,
                "Crawl complete"
            ),
            Ok(_) => error!(username = %handle, "Crawl finished without committing any record"),
            Err(e) => error!(username = %handle, "Crawl failed: {}", e),
        }

        result
    }

    async fn crawl(
        &mut self,
        page: &dyn BrowserPage,
        handle: &str,
    ) -> Result<CrawlOutcome, HarvestError> {
        let config = self.config;

        // Step 1: Open the profile
        let profile = profile_url(&config.target.base_url, handle)?;
        info!(username = %handle, url = %profile, "Opening profile");
        self.open(page, &profile, "profile navigation").await?;

        // Step 2: Fail fast on a missing account
        self.check_profile_exists(page, handle).await?;

        // Step 3: Load items
        let loaded = PaginationController::new(
            page,
            &config.selectors.items,
            config.crawl.scroll_delay(),
            &self.limiter,
        )
        .load_more(config.crawl.max_items)
        .await;

        if loaded == 0 {
            return Err(HarvestError::NoItems {
                username: handle.to_string(),
            });
        }
        info!(loaded, max_items = config.crawl.max_items, "Items loaded");

        // Step 4: Visit items one by one
        let mut tally = ItemTally::default();
        let mut profile_lost = false;
        for index in 0..config.crawl.max_items {
            // Handles go stale after navigation, so re-query every time
            let listing = {
                let items = enumerate_items(page, &config.selectors.items).await;
                let Some(item) = items.get(index) else {
                    info!(index, available = items.len(), "No more items available");
                    break;
                };
                extract_listing(item.as_ref(), config).await
            };

            let (state, position) = match listing {
                None => (ItemState::Dropped, Position::Profile),
                Some(listing) if self.dedup.is_committed(&listing.url) => {
                    debug!(index, url = %listing.url, "Already committed");
                    (ItemState::Duplicate, Position::Profile)
                }
                Some(listing) => self.process_item(page, listing, &profile, handle, index).await,
            };
            tally.record(state);
            debug!(index, state = %state, "Item processed");

            if position == Position::Lost {
                error!(index, "Profile page lost, stopping the item loop");
                profile_lost = true;
                break;
            }

            tokio::time::sleep(config.crawl.extraction_delay()).await;
            self.limiter.wait().await;
        }

        Ok(CrawlOutcome::from_tally(loaded, tally, profile_lost))
    }

    /// Visits the detail view of one item, commits its record, then goes
    /// back to the profile
    ///
    /// The record is committed before the return navigation, so it survives
    /// a failure to restore the profile.
    async fn process_item(
        &mut self,
        page: &dyn BrowserPage,
        listing: ListingFields,
        profile: &str,
        handle: &str,
        index: usize,
    ) -> (ItemState, Position) {
        let config = self.config;
        let url = listing.url.clone();

        let (detail, navigated) = match self.open(page, &url, "detail navigation").await {
            Ok(()) => (extract_detail(page, config).await, true),
            Err(e) => {
                warn!(index, url = %url, "Detail view unreachable, keeping grid fields only: {}", e);
                (DetailFields::default(), false)
            }
        };

        let state = match self.sink.accept(VideoRecord::merge(listing, detail, handle)) {
            Ok(()) => {
                self.dedup.commit(&url);
                info!(index, url = %url, "Record committed");
                if navigated {
                    ItemState::Committed
                } else {
                    ItemState::Partial
                }
            }
            Err(e) => {
                warn!(index, url = %url, "Sink rejected record: {}", e);
                ItemState::Failed
            }
        };

        // A failed detail navigation leaves the page where it was
        if !navigated {
            return (state, Position::Profile);
        }
        (state, self.return_to_profile(page, profile).await)
    }

    /// Navigates with retry, then lets client-side rendering settle
    async fn open(
        &self,
        page: &dyn BrowserPage,
        url: &str,
        operation: &str,
    ) -> Result<(), HarvestError> {
        self.retry.run(operation, move || page.goto(url)).await?;
        tokio::time::sleep(self.config.crawl.navigation_settle()).await;
        Ok(())
    }

    async fn return_to_profile(&self, page: &dyn BrowserPage, profile: &str) -> Position {
        match page.go_back().await {
            Ok(()) => {
                tokio::time::sleep(self.config.crawl.navigation_settle()).await;
                return Position::Profile;
            }
            Err(e) => warn!("History back failed, reloading profile: {}", e),
        }

        match self.open(page, profile, "profile reload").await {
            Ok(()) => Position::Profile,
            Err(e) => {
                error!(url = %profile, "Profile reload failed: {}", e);
                Position::Lost
            }
        }
    }

    async fn check_profile_exists(&self, page: &dyn BrowserPage, handle: &str) -> Result<(), HarvestError> {
        let marker = self.config.target.not_found_marker.as_str();
        if marker.is_empty() {
            return Ok(());
        }

        match page.content().await {
            Ok(content) if content.contains(marker) => Err(HarvestError::ProfileNotFound {
                username: handle.to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Could not read profile content: {}", e);
                Ok(())
            }
        }
    }
}
