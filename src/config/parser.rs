use crate::config::types::{BrowserEngine, Config};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Loads the configuration from an optional TOML file plus the environment
///
/// A `.env` file in the working directory is loaded first (if present), then
/// the TOML file is parsed over the defaults, then `REEL_*` variables are
/// applied, and the result is validated.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file, or `None` for defaults
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = load_unvalidated(path)?;
    validate(&config)?;
    Ok(config)
}

/// Same as [`load_config`] but leaves validation to the caller
///
/// Used when further overrides (command line flags) still have to be applied.
pub fn load_unvalidated(path: Option<&Path>) -> Result<Config, ConfigError> {
    // A missing .env is the normal case
    let _ = dotenvy::dotenv();

    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            parse_config(&content)?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Parses TOML content over the built-in defaults, without validating
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Applies `REEL_*` overrides from the given variable lookup
///
/// The lookup is injected so callers (and tests) decide where variables come
/// from. A present but malformed value is an error rather than being ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("REEL_USERNAME") {
        config.target.username = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_MAX_ITEMS")? {
        config.crawl.max_items = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_SCROLL_DELAY_MS")? {
        config.crawl.scroll_delay_ms = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_EXTRACTION_DELAY_MS")? {
        config.crawl.extraction_delay_ms = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_MAX_RETRIES")? {
        config.crawl.max_retries = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_PAGE_LOAD_TIMEOUT_MS")? {
        config.timeouts.page_load_ms = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_ELEMENT_WAIT_TIMEOUT_MS")? {
        config.timeouts.element_wait_ms = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_SCROLL_TIMEOUT_MS")? {
        config.timeouts.scroll_ms = value;
    }
    if let Some(value) = lookup("REEL_OUTPUT_DIR") {
        config.output.directory = PathBuf::from(value);
    }
    if let Some(value) = lookup("REEL_CSV_FILENAME") {
        config.output.filename = value;
    }
    if let Some(value) = lookup("REEL_LOG_DIR") {
        config.output.log_directory = Some(PathBuf::from(value));
    }
    if let Some(value) = lookup("REEL_HEADLESS") {
        config.browser.headless = parse_bool(&value).ok_or_else(|| ConfigError::Env {
            key: "REEL_HEADLESS".to_string(),
            value: value.clone(),
        })?;
    }
    if let Some(value) = lookup("REEL_BROWSER_ENGINE") {
        config.browser.engine =
            BrowserEngine::parse(&value).ok_or_else(|| ConfigError::Env {
                key: "REEL_BROWSER_ENGINE".to_string(),
                value: value.clone(),
            })?;
    }
    if let Some(value) = env_parse(&lookup, "REEL_WINDOW_WIDTH")? {
        config.browser.window_width = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_WINDOW_HEIGHT")? {
        config.browser.window_height = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_MIN_DELAY_MS")? {
        config.rate_limit.min_delay_ms = value;
    }
    if let Some(value) = env_parse(&lookup, "REEL_MAX_DELAY_MS")? {
        config.rate_limit.max_delay_ms = value;
    }

    Ok(())
}

fn env_parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Env {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is used to correlate a harvest run with the exact file it used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
[target]
username = "@somecreator"

[crawl]
max-items = 25
scroll-delay-ms = 500
max-retries = 3

[browser]
headless = false
window-width = 1280
window-height = 720

[rate-limit]
min-delay-ms = 100
max-delay-ms = 200

[output]
directory = "./out"
filename = "creator.csv"
append = true

[selectors]
views = [{ css = "strong.views" }]
"#;

        let config = parse_config(content).unwrap();
        assert_eq!(config.target.handle(), "somecreator");
        assert_eq!(config.crawl.max_items, 25);
        assert_eq!(config.crawl.max_retries, 3);
        assert!(!config.browser.headless);
        assert_eq!(config.rate_limit.max_delay_ms, 200);
        assert!(config.output.append);
        assert_eq!(config.output.csv_path(), PathBuf::from("./out/creator.csv"));
        assert_eq!(config.selectors.views.len(), 1);
        assert_eq!(config.selectors.views[0].css, "strong.views");

        // Untouched sections keep their defaults
        assert_eq!(config.target.item_path_marker, "/video/");
        assert_eq!(config.timeouts.page_load_ms, 30_000);
        assert!(!config.selectors.items.is_empty());
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crawl.max_items, 100);
        assert_eq!(config.crawl.max_retries, 5);
        assert_eq!(config.rate_limit.min_delay_ms, 2000);
        assert_eq!(config.browser.engine, BrowserEngine::Chromium);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = parse_config("this is not valid TOML {{{");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides_applied() {
        let mut config = Config::default();
        let env = env_from(&[
            ("REEL_USERNAME", "envcreator"),
            ("REEL_MAX_ITEMS", "7"),
            ("REEL_HEADLESS", "false"),
            ("REEL_BROWSER_ENGINE", "chrome"),
            ("REEL_MIN_DELAY_MS", "0"),
            ("REEL_MAX_DELAY_MS", "10"),
            ("REEL_OUTPUT_DIR", "/tmp/harvest"),
        ]);

        apply_env_overrides(&mut config, env).unwrap();

        assert_eq!(config.target.username, "envcreator");
        assert_eq!(config.crawl.max_items, 7);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.engine, BrowserEngine::Chromium);
        assert_eq!(config.rate_limit.max_delay_ms, 10);
        assert_eq!(config.output.directory, PathBuf::from("/tmp/harvest"));
    }

    #[test]
    fn test_env_override_malformed_number() {
        let mut config = Config::default();
        let env = env_from(&[("REEL_MAX_ITEMS", "lots")]);

        let err = apply_env_overrides(&mut config, env).unwrap_err();
        match err {
            ConfigError::Env { key, value } => {
                assert_eq!(key, "REEL_MAX_ITEMS");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_override_malformed_bool() {
        let mut config = Config::default();
        let env = env_from(&[("REEL_HEADLESS", "maybe")]);
        assert!(apply_env_overrides(&mut config, env).is_err());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Some(Path::new("/nonexistent/harvest.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
