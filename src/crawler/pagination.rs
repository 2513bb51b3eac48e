//! Infinite-scroll pagination
//!
//! The controller is a small state machine:
//!
//! - `Scanning { stalls }`: scroll to the bottom, wait for the feed to settle,
//!   re-measure. Growth resets `stalls`; no growth increments it.
//! - `Done`: the visible count reached the cap, or `STALL_LIMIT` consecutive
//!   scans produced nothing new (the feed is exhausted, not an error).

use crate::browser::BrowserPage;
use crate::crawler::rate_limit::RateLimiter;
use crate::extract::{enumerate_items, Locator};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Consecutive no-growth scans after which the feed counts as exhausted
pub const STALL_LIMIT: u32 = 3;

/// Why pagination stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Enough items are visible
    LimitReached,
    /// The feed stopped growing
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning { stalls: u32 },
    Done(StopReason),
}

/// Drives scroll-to-load-more on one page
pub struct PaginationController<'a> {
    page: &'a dyn BrowserPage,
    items: &'a [Locator],
    settle: Duration,
    limiter: &'a RateLimiter,
}

impl<'a> PaginationController<'a> {
    /// # Arguments
    ///
    /// * `page` - The page showing the feed
    /// * `items` - Locator candidates for the feed's item containers
    /// * `settle` - Pause after each scroll before re-measuring
    /// * `limiter` - Throttles every scan
    pub fn new(
        page: &'a dyn BrowserPage,
        items: &'a [Locator],
        settle: Duration,
        limiter: &'a RateLimiter,
    ) -> Self {
        Self {
            page,
            items,
            settle,
            limiter,
        }
    }

    /// Scrolls until `max_items` are visible or the feed stops growing
    ///
    /// # Returns
    ///
    /// The final visible item count, which may be below `max_items`
    pub async fn load_more(&self, max_items: usize) -> usize {
        let mut count = self.visible_count().await;
        let mut scans = 0u32;
        let mut state = if count >= max_items {
            ScanState::Done(StopReason::LimitReached)
        } else {
            ScanState::Scanning { stalls: 0 }
        };

        loop {
            let stalls = match state {
                ScanState::Done(reason) => {
                    info!(
                        visible = count,
                        scans,
                        reason = ?reason,
                        "Pagination finished"
                    );
                    return count;
                }
                ScanState::Scanning { stalls } => stalls,
            };

            self.limiter.wait().await;

            // A failed scroll is just a scan that loaded nothing
            if let Err(e) = self.page.scroll_to_bottom().await {
                warn!("Scroll failed: {}", e);
            }
            scans += 1;

            if !self.settle.is_zero() {
                tokio::time::sleep(self.settle).await;
            }

            let measured = self.visible_count().await;
            state = next_state(count, measured, stalls, max_items);
            debug!(before = count, after = measured, scans, "Scan complete");
            count = measured;
        }
    }

    async fn visible_count(&self) -> usize {
        enumerate_items(self.page, self.items).await.len()
    }
}

fn next_state(before: usize, after: usize, stalls: u32, max_items: usize) -> ScanState {
    if after >= max_items {
        ScanState::Done(StopReason::LimitReached)
    } else if after > before {
        ScanState::Scanning { stalls: 0 }
    } else if stalls + 1 >= STALL_LIMIT {
        ScanState::Done(StopReason::Exhausted)
    } else {
        ScanState::Scanning { stalls: stalls + 1 }
    }
}
