//! Offline replay backend over static HTML documents
//!
//! A [`SnapshotSite`] maps URLs to documents. A feed URL holds several
//! stages: each scroll-to-bottom advances to the next stage, which is how an
//! infinite-scroll feed is replayed. Any other URL holds a single document.
//! Navigating to an unknown URL fails like an unreachable page would.
//!
//! Documents are re-parsed on every query so that handles stay `Send`.

use super::{BrowserError, BrowserLauncher, BrowserPage, BrowserResult, BrowserSession, PageNode, SearchRoot};
use crate::config::Config;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// The set of documents a snapshot browser can visit
#[derive(Debug, Clone, Default)]
pub struct SnapshotSite {
    feeds: HashMap<String, Vec<String>>,
    pages: HashMap<String, String>,
}

impl SnapshotSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scrollable feed whose documents grow stage by stage
    pub fn with_feed(mut self, url: impl Into<String>, stages: Vec<String>) -> Self {
        self.feeds.insert(url.into(), stages);
        self
    }

    /// Registers a single static document
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    fn knows(&self, url: &str) -> bool {
        self.feeds.get(url).is_some_and(|stages| !stages.is_empty()) || self.pages.contains_key(url)
    }
}

/// Starts [`SnapshotSession`]s over a shared site
#[derive(Debug, Clone)]
pub struct SnapshotLauncher {
    site: Arc<SnapshotSite>,
}

impl SnapshotLauncher {
    pub fn new(site: SnapshotSite) -> Self {
        Self {
            site: Arc::new(site),
        }
    }
}

#[async_trait]
impl BrowserLauncher for SnapshotLauncher {
    async fn launch(&self, _config: &Config) -> BrowserResult<Box<dyn BrowserSession>> {
        Ok(Box::new(SnapshotSession {
            page: SnapshotPage::new(Arc::clone(&self.site)),
        }))
    }
}

/// A session with one [`SnapshotPage`]
pub struct SnapshotSession {
    page: SnapshotPage,
}

#[async_trait]
impl BrowserSession for SnapshotSession {
    fn page(&self) -> &dyn BrowserPage {
        &self.page
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Navigation {
    history: Vec<String>,
    stages: HashMap<String, usize>,
}

/// In-memory page replaying a [`SnapshotSite`]
#[derive(Debug)]
pub struct SnapshotPage {
    site: Arc<SnapshotSite>,
    state: Mutex<Navigation>,
}

impl SnapshotPage {
    pub fn new(site: Arc<SnapshotSite>) -> Self {
        Self {
            site,
            state: Mutex::new(Navigation::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, Navigation> {
        // A poisoned lock only means a test panicked mid-query; the data is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_html(&self) -> BrowserResult<String> {
        let state = self.state();
        let url = state.history.last().ok_or(BrowserError::Closed)?;

        if let Some(stages) = self.site.feeds.get(url) {
            let stage = state.stages.get(url).copied().unwrap_or(0);
            if let Some(html) = stages.get(stage) {
                return Ok(html.clone());
            }
        }

        self.site
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::navigation(url, "no snapshot for this URL"))
    }

    fn select_all(&self, selector: &str) -> BrowserResult<Vec<SnapshotNode>> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.current_html()?);
        Ok(document.select(&selector).map(SnapshotNode::capture).collect())
    }
}

#[async_trait]
impl SearchRoot for SnapshotPage {
    async fn find(&self, selector: &str) -> BrowserResult<Option<Box<dyn PageNode>>> {
        Ok(self
            .select_all(selector)?
            .into_iter()
            .next()
            .map(SnapshotNode::boxed))
    }
}

#[async_trait]
impl BrowserPage for SnapshotPage {
    async fn goto(&self, url: &str) -> BrowserResult<()> {
        if !self.site.knows(url) {
            return Err(BrowserError::navigation(url, "no snapshot for this URL"));
        }
        debug!("Snapshot navigation to {}", url);
        self.state().history.push(url.to_string());
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        self.current_html()
    }

    async fn scroll_to_bottom(&self) -> BrowserResult<()> {
        let mut state = self.state();
        let url = state.history.last().cloned().ok_or(BrowserError::Closed)?;
        if let Some(stages) = self.site.feeds.get(&url) {
            let last = stages.len().saturating_sub(1);
            let stage = state.stages.entry(url).or_insert(0);
            *stage = (*stage + 1).min(last);
        }
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> BrowserResult<Vec<Box<dyn PageNode>>> {
        Ok(self
            .select_all(selector)?
            .into_iter()
            .map(SnapshotNode::boxed)
            .collect())
    }

    async fn go_back(&self) -> BrowserResult<()> {
        let mut state = self.state();
        if state.history.len() < 2 {
            let url = state.history.last().cloned().unwrap_or_default();
            return Err(BrowserError::navigation(&url, "no previous history entry"));
        }
        state.history.pop();
        Ok(())
    }
}

/// An element captured as its outer HTML
///
/// The enclosing element is captured alongside, one level deep: the parent
/// of a parent is not available.
#[derive(Debug, Clone)]
pub struct SnapshotNode {
    html: String,
    parent: Option<String>,
}

impl SnapshotNode {
    fn capture(element: ElementRef<'_>) -> Self {
        // `body` and `html` do not survive fragment parsing
        let parent = element
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|parent| !matches!(parent.value().name(), "body" | "html"))
            .map(|parent| parent.html());
        Self {
            html: element.html(),
            parent,
        }
    }

    fn boxed(self) -> Box<dyn PageNode> {
        Box::new(self)
    }

    /// Runs `read` against the element itself inside a freshly parsed fragment
    fn with_element<T>(&self, read: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let fragment = Html::parse_fragment(&self.html);
        let element = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)?;
        Some(read(element))
    }
}

#[async_trait]
impl SearchRoot for SnapshotNode {
    async fn find(&self, selector: &str) -> BrowserResult<Option<Box<dyn PageNode>>> {
        let selector = parse_selector(selector)?;
        let found = self
            .with_element(|element| {
                element
                    .descendants()
                    .skip(1)
                    .filter_map(ElementRef::wrap)
                    .find(|candidate| selector.matches(candidate))
                    .map(SnapshotNode::capture)
            })
            .flatten();
        Ok(found.map(SnapshotNode::boxed))
    }
}

#[async_trait]
impl PageNode for SnapshotNode {
    async fn text(&self) -> BrowserResult<Option<String>> {
        Ok(self.with_element(|element| element.text().collect::<String>()))
    }

    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        Ok(self
            .with_element(|element| element.value().attr(name).map(str::to_string))
            .flatten())
    }

    async fn parent(&self) -> BrowserResult<Option<Box<dyn PageNode>>> {
        Ok(self.parent.clone().map(|html| {
            SnapshotNode { html, parent: None }.boxed()
        }))
    }
}

fn parse_selector(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector(format!("{}: {:?}", selector, e)))
}
