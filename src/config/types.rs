use crate::extract::Locator;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Reel-Harvest
///
/// Every section falls back to its defaults, so an empty TOML file (or no
/// file at all, with only environment overrides) is a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub crawl: CrawlConfig,
    pub timeouts: TimeoutConfig,
    pub browser: BrowserConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub output: OutputConfig,
    pub selectors: SelectorConfig,
}

/// The profile being harvested and the site conventions around it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Profile handle, with or without the leading `@`
    pub username: String,

    /// Site origin the profile lives on
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path fragment that marks an item URL (e.g. `/video/`)
    #[serde(rename = "item-path-marker")]
    pub item_path_marker: String,

    /// Text the site renders when the profile does not exist
    #[serde(rename = "not-found-marker")]
    pub not_found_marker: String,

    /// Substrings a thumbnail URL must contain to be accepted
    #[serde(rename = "thumbnail-hosts")]
    pub thumbnail_hosts: Vec<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            base_url: "https://www.tiktok.com".to_string(),
            item_path_marker: "/video/".to_string(),
            not_found_marker: "User not found".to_string(),
            thumbnail_hosts: vec!["tiktok".to_string(), "amazonaws".to_string()],
        }
    }
}

impl TargetConfig {
    /// Returns the username without its leading `@`
    pub fn handle(&self) -> &str {
        self.username.trim().trim_start_matches('@')
    }
}

/// Crawl pacing and limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of items to load and extract
    #[serde(rename = "max-items")]
    pub max_items: usize,

    /// Pause after each scroll before the feed is re-measured (milliseconds)
    #[serde(rename = "scroll-delay-ms")]
    pub scroll_delay_ms: u64,

    /// Additional wait for lazy content after the scroll pause (milliseconds)
    #[serde(rename = "scroll-settle-ms")]
    pub scroll_settle_ms: u64,

    /// Fixed pause between two items (milliseconds)
    #[serde(rename = "extraction-delay-ms")]
    pub extraction_delay_ms: u64,

    /// Pause after every navigation so client-side rendering can finish (milliseconds)
    #[serde(rename = "navigation-settle-ms")]
    pub navigation_settle_ms: u64,

    /// Attempts made for transient operations (navigation)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry (milliseconds)
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            scroll_delay_ms: 3000,
            scroll_settle_ms: 2000,
            extraction_delay_ms: 1000,
            navigation_settle_ms: 2000,
            max_retries: 5,
            retry_base_delay_ms: 1000,
        }
    }
}

impl CrawlConfig {
    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms + self.scroll_settle_ms)
    }

    pub fn extraction_delay(&self) -> Duration {
        Duration::from_millis(self.extraction_delay_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

/// Browser operation timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Navigation and page load timeout (milliseconds)
    #[serde(rename = "page-load-ms")]
    pub page_load_ms: u64,

    /// Element lookup and read timeout (milliseconds)
    #[serde(rename = "element-wait-ms")]
    pub element_wait_ms: u64,

    /// Scroll action timeout (milliseconds)
    #[serde(rename = "scroll-ms")]
    pub scroll_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            page_load_ms: 30_000,
            element_wait_ms: 10_000,
            scroll_ms: 5_000,
        }
    }
}

/// Browser engine selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserEngine {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Some(Self::Chromium),
            "firefox" => Some(Self::Firefox),
            "webkit" => Some(Self::Webkit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

/// Browser launch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub engine: BrowserEngine,

    /// Run without a visible window
    pub headless: bool,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,

    /// Locale reported to pages (e.g. `fr-FR`)
    pub locale: String,

    /// IANA timezone reported to pages (e.g. `Europe/Paris`)
    pub timezone: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Explicit Chrome/Chromium binary; auto-detected when unset
    #[serde(rename = "chrome-executable")]
    pub chrome_executable: Option<PathBuf>,

    /// Extra command line switches passed to the browser
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::Chromium,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            locale: "fr-FR".to_string(),
            timezone: "Europe/Paris".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            chrome_executable: None,
            args: Vec::new(),
        }
    }
}

/// Randomized delay bounds between browser actions
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2000,
            max_delay_ms: 5000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the CSV file is written to
    pub directory: PathBuf,

    /// CSV file name inside `directory`
    pub filename: String,

    /// Append to an existing file instead of overwriting it
    pub append: bool,

    /// Directory for the log file; file logging is off when unset
    #[serde(rename = "log-directory")]
    pub log_directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            filename: "videos.csv".to_string(),
            append: false,
            log_directory: None,
        }
    }
}

impl OutputConfig {
    /// Full path of the CSV file
    pub fn csv_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// Ordered locator candidates for each extracted field
///
/// Candidates are tried first to last, so the most specific and stable
/// selectors belong at the front of each list.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Item containers in the profile grid
    pub items: Vec<Locator>,

    #[serde(rename = "video-link")]
    pub video_link: Vec<Locator>,

    pub thumbnail: Vec<Locator>,

    /// View counter, read from the grid item
    pub views: Vec<Locator>,

    /// Caption, read from the detail view
    pub description: Vec<Locator>,

    /// Like counter, read from the detail view
    pub likes: Vec<Locator>,

    /// Comment counter, read from the detail view
    pub comments: Vec<Locator>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            items: vec![
                Locator::text(r#"[data-e2e="user-post-item"]"#),
                Locator::text(r#"[data-e2e="user-post-item-desc"]"#),
                Locator::text(".tiktok-1g04lal-DivItemContainer"),
                Locator::text(r#"[data-e2e="video-feed-item"]"#),
                Locator::text(r#"div[class*="DivItemContainer"]"#),
            ],
            video_link: vec![
                Locator::attribute(r#"a[href*="/video/"]"#, "href"),
                Locator::attribute(r#"[data-e2e="video-link"]"#, "href"),
                Locator::attribute(r#"a[href*="tiktok.com"]"#, "href"),
            ],
            thumbnail: vec![
                Locator::attribute(r#"img[data-e2e="video-cover"]"#, "src"),
                Locator::attribute(r#"img[alt*="video"]"#, "src"),
                Locator::attribute("img", "src"),
            ],
            views: vec![
                Locator::text(r#"[data-e2e="video-views"]"#),
                Locator::text(".video-count"),
                Locator::text("strong.video-count"),
                Locator::text(r#"[data-e2e="like-count"]"#),
                Locator::text("strong"),
            ],
            description: vec![
                Locator::text(r#"[data-e2e="browse-video-desc"]"#),
                Locator::text(r#"[data-e2e="video-desc"]"#),
                Locator::text(".tiktok-1g04lal-DivItemContainer span"),
                Locator::text(r#"[data-e2e="user-post-item-desc"]"#),
            ],
            likes: vec![
                Locator::text(r#"[data-e2e="browse-like-count"]"#),
                Locator::text(r#"[data-e2e="like-count"]"#),
                Locator::text(r#"[data-e2e="video-views"]"#),
                Locator::text("strong"),
            ],
            comments: vec![
                Locator::text(r#"[data-e2e="browse-comment-count"]"#),
                Locator::text(r#"[data-e2e="comment-count"]"#),
                Locator::text(r#"[data-e2e="video-views"]"#),
                Locator::text("strong"),
            ],
        }
    }
}
