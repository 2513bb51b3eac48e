//! Configuration module for Reel-Harvest
//!
//! This module handles loading, parsing, and validating the configuration.
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `REEL_*` environment variables (a `.env` file is honoured), and finally
//! whatever the command line overrides.
//!
//! # Example
//!
//! ```no_run
//! use reel_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("harvest.toml"))).unwrap();
//! println!("Will load up to {} items", config.crawl.max_items);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, BrowserEngine, Config, CrawlConfig, OutputConfig, RateLimitConfig,
    SelectorConfig, TargetConfig, TimeoutConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_unvalidated,
    parse_config,
};
pub use validation::validate;
