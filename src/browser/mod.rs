//! Browser automation surface
//!
//! The crawl pipeline only talks to these traits. Two backends implement
//! them:
//!
//! - [`ChromeLauncher`]: a real Chrome/Chromium driven over the DevTools protocol
//! - [`SnapshotLauncher`]: static HTML documents replayed in memory, for
//!   offline runs and tests
//!
//! All operations on one page are issued sequentially by a single task.

mod chrome;
mod error;
mod snapshot;

pub use chrome::ChromeLauncher;
pub use error::{BrowserError, BrowserResult};
pub use snapshot::{SnapshotLauncher, SnapshotPage, SnapshotSite};

use crate::config::Config;
use async_trait::async_trait;

/// Anything a selector can be evaluated against: a whole page or one element
#[async_trait]
pub trait SearchRoot: Send + Sync {
    /// Returns the first descendant matching `selector`, if any
    async fn find(&self, selector: &str) -> BrowserResult<Option<Box<dyn PageNode>>>;
}

/// A handle to one element of the current document
///
/// Handles may go stale once the page navigates; re-query instead of
/// keeping them across navigations.
#[async_trait]
pub trait PageNode: SearchRoot {
    /// Rendered text of the element
    async fn text(&self) -> BrowserResult<Option<String>>;

    /// Value of the attribute `name`
    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>>;

    /// The enclosing element, if any
    async fn parent(&self) -> BrowserResult<Option<Box<dyn PageNode>>>;
}

/// The single page a crawl drives
#[async_trait]
pub trait BrowserPage: SearchRoot {
    /// Navigates to `url` and waits for the document to be ready
    async fn goto(&self, url: &str) -> BrowserResult<()>;

    /// Full HTML of the current document
    async fn content(&self) -> BrowserResult<String>;

    /// Scrolls to the bottom of the document so lazy feeds load more
    async fn scroll_to_bottom(&self) -> BrowserResult<()>;

    /// Returns every element matching `selector`, in document order
    async fn find_all(&self, selector: &str) -> BrowserResult<Vec<Box<dyn PageNode>>>;

    /// Goes one entry back in the session history
    async fn go_back(&self) -> BrowserResult<()>;
}

/// A launched browser owning one page
#[async_trait]
pub trait BrowserSession: Send {
    fn page(&self) -> &dyn BrowserPage;

    /// Releases the browser; the session is consumed
    async fn close(self: Box<Self>) -> BrowserResult<()>;
}

/// Starts browser sessions configured from [`Config`]
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &Config) -> BrowserResult<Box<dyn BrowserSession>>;
}
