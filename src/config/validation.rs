use crate::config::types::{
    BrowserConfig, BrowserEngine, Config, CrawlConfig, OutputConfig, RateLimitConfig,
    SelectorConfig, TargetConfig, TimeoutConfig,
};
use crate::extract::Locator;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawl_config(&config.crawl)?;
    validate_timeout_config(&config.timeouts)?;
    validate_browser_config(&config.browser)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_output_config(&config.output)?;
    validate_selector_config(&config.selectors)?;
    Ok(())
}

/// Validates the target profile and site conventions
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let handle = config.handle();
    if handle.is_empty() {
        return Err(ConfigError::Validation(
            "username cannot be empty (set [target] username or REEL_USERNAME)".to_string(),
        ));
    }

    if !handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "username must contain only letters, digits, '.' and '_', got '{}'",
            config.username
        )));
    }

    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
    if base.scheme() != "https" && base.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must be http(s), got '{}'",
            config.base_url
        )));
    }

    if config.item_path_marker.trim().is_empty() {
        return Err(ConfigError::Validation(
            "item_path_marker cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl limits
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_items < 1 {
        return Err(ConfigError::Validation(format!(
            "max_items must be >= 1, got {}",
            config.max_items
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

fn validate_timeout_config(config: &TimeoutConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("page_load_ms", config.page_load_ms),
        ("element_wait_ms", config.element_wait_ms),
        ("scroll_ms", config.scroll_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{} must be > 0", name)));
        }
    }
    Ok(())
}

/// Validates browser launch settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    // Only the DevTools protocol backend exists
    if config.engine != BrowserEngine::Chromium {
        return Err(ConfigError::Validation(format!(
            "browser engine '{}' is not supported, only 'chromium' can be driven",
            config.engine.as_str()
        )));
    }

    for (name, value) in [
        ("window_width", config.window_width),
        ("window_height", config.window_height),
    ] {
        if !(320..=7680).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 320 and 7680, got {}",
                name, value
            )));
        }
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }
    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.filename.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output filename cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates every locator list: non-empty, each selector parseable
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (field, locators) in [
        ("items", &config.items),
        ("video_link", &config.video_link),
        ("thumbnail", &config.thumbnail),
        ("views", &config.views),
        ("description", &config.description),
        ("likes", &config.likes),
        ("comments", &config.comments),
    ] {
        validate_locators(field, locators)?;
    }
    Ok(())
}

fn validate_locators(field: &str, locators: &[Locator]) -> Result<(), ConfigError> {
    if locators.is_empty() {
        return Err(ConfigError::Validation(format!(
            "selector list '{}' must have at least one entry",
            field
        )));
    }

    for locator in locators {
        if Selector::parse(&locator.css).is_err() {
            return Err(ConfigError::Validation(format!(
                "selector '{}' in '{}' is not a valid CSS selector",
                locator.css, field
            )));
        }
    }

    Ok(())
}
