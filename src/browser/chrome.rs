//! Chrome/Chromium backend over the DevTools protocol

use super::{BrowserError, BrowserLauncher, BrowserPage, BrowserResult, BrowserSession, PageNode, SearchRoot};
use crate::config::Config;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    GetNavigationHistoryParams, NavigateToHistoryEntryParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Launch switches that keep the automation banner and related hints away
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
    "--disable-infobars",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Resolves once the document is interactive
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
        }
    })
"#;

const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Attribute used to hand a parent element back through a selector query
const PARENT_MARK: &str = "data-reel-parent";

static NEXT_PARENT_MARK: AtomicU64 = AtomicU64::new(1);

/// Per-operation limits taken from the `[timeouts]` section
#[derive(Debug, Clone, Copy)]
struct Limits {
    page_load: Duration,
    element_wait: Duration,
    scroll: Duration,
}

impl Limits {
    fn from_config(config: &Config) -> Self {
        Self {
            page_load: Duration::from_millis(config.timeouts.page_load_ms),
            element_wait: Duration::from_millis(config.timeouts.element_wait_ms),
            scroll: Duration::from_millis(config.timeouts.scroll_ms),
        }
    }
}

/// Launches a local Chrome/Chromium
#[derive(Debug, Default, Clone)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, config: &Config) -> BrowserResult<Box<dyn BrowserSession>> {
        let browser_config = &config.browser;
        let limits = Limits::from_config(config);

        let mut builder = CdpBrowserConfig::builder()
            .window_size(browser_config.window_width, browser_config.window_height)
            .viewport(None)
            .request_timeout(limits.page_load)
            .no_sandbox();

        // with_head means NOT headless
        if !browser_config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = browser_config.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        for arg in STEALTH_ARGS {
            builder = builder.arg(*arg);
        }
        builder = builder.arg(format!("--lang={}", browser_config.locale));
        for arg in &browser_config.args {
            builder = builder.arg(arg.as_str());
        }

        let cdp_config = builder.build().map_err(BrowserError::Launch)?;

        info!(
            headless = browser_config.headless,
            width = browser_config.window_width,
            height = browser_config.window_height,
            "Launching Chromium"
        );

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        // The handler drives the websocket; it must be polled for the browser to respond
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        let mut session = ChromeSession {
            browser,
            page: ChromePage { page, limits },
            handler_task,
        };

        if let Err(e) = session.page.apply_profile(config).await {
            session.shutdown().await;
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

/// A running browser and its single page
pub struct ChromeSession {
    browser: Browser,
    page: ChromePage,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    async fn shutdown(&mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        self.handler_task.abort();
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    fn page(&self) -> &dyn BrowserPage {
        &self.page
    }

    async fn close(self: Box<Self>) -> BrowserResult<()> {
        let mut session = *self;
        session.shutdown().await;
        info!("Browser closed");
        Ok(())
    }
}

/// The DevTools page handle plus the limits applied to each call
pub struct ChromePage {
    page: Page,
    limits: Limits,
}

impl ChromePage {
    /// Applies user agent, locale and timezone emulation before any navigation
    async fn apply_profile(&self, config: &Config) -> BrowserResult<()> {
        let browser_config = &config.browser;

        let mut user_agent = SetUserAgentOverrideParams::new(browser_config.user_agent.clone());
        user_agent.accept_language = Some(browser_config.locale.clone());
        with_timeout("set user agent", self.limits.page_load, self.page.execute(user_agent))
            .await?;

        let locale = SetLocaleOverrideParams {
            locale: Some(browser_config.locale.clone()),
        };
        if let Err(e) = with_timeout("set locale", self.limits.page_load, self.page.execute(locale)).await {
            warn!("Locale override rejected: {}", e);
        }

        let timezone = SetTimezoneOverrideParams::new(browser_config.timezone.clone());
        if let Err(e) =
            with_timeout("set timezone", self.limits.page_load, self.page.execute(timezone)).await
        {
            warn!("Timezone override rejected: {}", e);
        }

        Ok(())
    }

    async fn wait_for_ready(&self) {
        match tokio::time::timeout(
            self.limits.page_load,
            self.page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()),
        )
        .await
        {
            Ok(Ok(result)) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Ok(Err(e)) => debug!("Could not check ready state: {}", e),
            Err(_) => warn!("Timeout waiting for page ready state"),
        }
    }
}

#[async_trait]
impl SearchRoot for ChromePage {
    async fn find(&self, selector: &str) -> BrowserResult<Option<Box<dyn PageNode>>> {
        let elements = with_timeout(
            "find element",
            self.limits.element_wait,
            self.page.find_elements(selector),
        )
        .await?;
        Ok(elements
            .into_iter()
            .next()
            .map(|element| ChromeNode::boxed(element, self.page.clone(), self.limits)))
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str) -> BrowserResult<()> {
        debug!("Navigating to {}", url);
        match tokio::time::timeout(self.limits.page_load, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(BrowserError::navigation(url, e)),
            Err(_) => {
                return Err(BrowserError::Timeout {
                    operation: format!("navigation to {}", url),
                    after_ms: self.limits.page_load.as_millis() as u64,
                })
            }
        }
        self.wait_for_ready().await;
        Ok(())
    }

    async fn content(&self) -> BrowserResult<String> {
        with_timeout("read content", self.limits.page_load, self.page.content()).await
    }

    async fn scroll_to_bottom(&self) -> BrowserResult<()> {
        match tokio::time::timeout(self.limits.scroll, self.page.evaluate(SCROLL_SCRIPT.to_string())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Script(e.to_string())),
            Err(_) => Err(BrowserError::Timeout {
                operation: "scroll".to_string(),
                after_ms: self.limits.scroll.as_millis() as u64,
            }),
        }
    }

    async fn find_all(&self, selector: &str) -> BrowserResult<Vec<Box<dyn PageNode>>> {
        let elements = with_timeout(
            "find elements",
            self.limits.element_wait,
            self.page.find_elements(selector),
        )
        .await?;
        Ok(elements
            .into_iter()
            .map(|element| ChromeNode::boxed(element, self.page.clone(), self.limits))
            .collect())
    }

    async fn go_back(&self) -> BrowserResult<()> {
        let history = with_timeout(
            "read history",
            self.limits.page_load,
            self.page.execute(GetNavigationHistoryParams::default()),
        )
        .await?
        .result;

        let previous = usize::try_from(history.current_index - 1)
            .ok()
            .and_then(|index| history.entries.get(index))
            .ok_or_else(|| BrowserError::navigation("history", "no previous entry"))?;
        let target = previous.url.clone();

        with_timeout(
            "history back",
            self.limits.page_load,
            self.page
                .execute(NavigateToHistoryEntryParams::new(previous.id)),
        )
        .await
        .map_err(|e| BrowserError::navigation(&target, e))?;

        self.wait_for_ready().await;
        Ok(())
    }
}

/// One element of the current document
pub struct ChromeNode {
    element: Element,
    page: Page,
    limits: Limits,
}

impl ChromeNode {
    fn boxed(element: Element, page: Page, limits: Limits) -> Box<dyn PageNode> {
        Box::new(Self { element, page, limits })
    }
}

#[async_trait]
impl SearchRoot for ChromeNode {
    async fn find(&self, selector: &str) -> BrowserResult<Option<Box<dyn PageNode>>> {
        let elements = with_timeout(
            "find element",
            self.limits.element_wait,
            self.element.find_elements(selector),
        )
        .await?;
        Ok(elements
            .into_iter()
            .next()
            .map(|element| ChromeNode::boxed(element, self.page.clone(), self.limits)))
    }
}

#[async_trait]
impl PageNode for ChromeNode {
    async fn text(&self) -> BrowserResult<Option<String>> {
        with_timeout("read text", self.limits.element_wait, self.element.inner_text()).await
    }

    async fn attribute(&self, name: &str) -> BrowserResult<Option<String>> {
        with_timeout(
            "read attribute",
            self.limits.element_wait,
            self.element.attribute(name),
        )
        .await
    }

    async fn parent(&self) -> BrowserResult<Option<Box<dyn PageNode>>> {
        // Mark the parent in the DOM, then look it up by that mark
        let mark = NEXT_PARENT_MARK.fetch_add(1, Ordering::Relaxed);
        let script = format!(
            "function() {{ if (this.parentElement) {{ this.parentElement.setAttribute('{}', '{}'); }} }}",
            PARENT_MARK, mark
        );
        with_timeout(
            "mark parent",
            self.limits.element_wait,
            self.element.call_js_fn(script, false),
        )
        .await?;

        let selector = format!("[{}=\"{}\"]", PARENT_MARK, mark);
        let elements = with_timeout(
            "find parent",
            self.limits.element_wait,
            self.page.find_elements(selector),
        )
        .await?;
        Ok(elements
            .into_iter()
            .next()
            .map(|element| ChromeNode::boxed(element, self.page.clone(), self.limits)))
    }
}

/// Bounds a DevTools call by `limit`
async fn with_timeout<T, F>(operation: &str, limit: Duration, call: F) -> BrowserResult<T>
where
    F: Future<Output = Result<T, CdpError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(BrowserError::Protocol(format!("{}: {}", operation, e))),
        Err(_) => Err(BrowserError::Timeout {
            operation: operation.to_string(),
            after_ms: limit.as_millis() as u64,
        }),
    }
}
