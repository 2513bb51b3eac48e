//! Reel-Harvest main entry point
//!
//! This is the command-line interface for the Reel-Harvest profile harvester.

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use reel_harvest::config::{compute_config_hash, load_unvalidated, validate, Config};
use reel_harvest::crawler::crawl;
use reel_harvest::output::{print_statistics, CsvSink, RecordStatistics};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Reel-Harvest: a profile feed harvester
///
/// Reel-Harvest opens a creator's public profile in a browser, scrolls the
/// feed until enough items are loaded, visits each item for its detail
/// counters, and writes the deduplicated records to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "reel-harvest")]
#[command(version)]
#[command(about = "A profile feed harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults plus REEL_* variables when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Profile to harvest, overrides the configured username
    #[arg(short, long)]
    username: Option<String>,

    /// Maximum number of items to extract
    #[arg(short, long)]
    max_items: Option<usize>,

    /// Directory the CSV file is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Append to the existing CSV file and skip already harvested items
    #[arg(long)]
    append: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without opening a browser
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the existing CSV file and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(username) = &self.username {
            config.target.username = username.clone();
        }
        if let Some(max_items) = self.max_items {
            config.crawl.max_items = max_items;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.append {
            config.output.append = true;
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration, then layer the command line on top
    let mut config = load_unvalidated(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    // Setup logging based on verbosity; the guard flushes the log file on exit
    let _guard = setup_logging(cli.verbose, cli.quiet, &config)?;

    if let Some(path) = &cli.config {
        let hash = compute_config_hash(path)?;
        tracing::info!("Configuration loaded from {} (hash: {})", path.display(), hash);
    }

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the tracing subscriber: console always, plus a log file when
/// `output.log-directory` is configured
fn setup_logging(verbose: u8, quiet: bool, config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        match verbose {
            0 => EnvFilter::new("reel_harvest=info,warn"),
            1 => EnvFilter::new("reel_harvest=debug,info"),
            2 => EnvFilter::new("reel_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, guard) = match &config.output.log_directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let name = format!("harvest_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Handles the --dry-run mode: shows what would be harvested
fn handle_dry_run(config: &Config) {
    println!("=== Reel-Harvest Dry Run ===\n");

    println!("Target:");
    println!("  Username: @{}", config.target.handle());
    println!("  Base URL: {}", config.target.base_url);

    println!("\nCrawl:");
    println!("  Max items: {}", config.crawl.max_items);
    println!("  Scroll delay: {}ms (+{}ms settle)", config.crawl.scroll_delay_ms, config.crawl.scroll_settle_ms);
    println!("  Extraction delay: {}ms", config.crawl.extraction_delay_ms);
    println!(
        "  Retries: {} (base delay {}ms)",
        config.crawl.max_retries, config.crawl.retry_base_delay_ms
    );
    println!(
        "  Rate limit: {}-{}ms",
        config.rate_limit.min_delay_ms, config.rate_limit.max_delay_ms
    );

    println!("\nBrowser:");
    println!("  Engine: {}", config.browser.engine.as_str());
    println!("  Headless: {}", config.browser.headless);
    println!("  Window: {}x{}", config.browser.window_width, config.browser.window_height);
    println!("  Locale: {} / {}", config.browser.locale, config.browser.timezone);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path().display());
    println!("  Mode: {}", if config.output.append { "append" } else { "overwrite" });

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics of the existing CSV file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let sink = CsvSink::new(&config.output);
    let file = sink.file_info()?;
    let records = sink
        .load_existing()
        .with_context(|| format!("Failed to read {}", sink.path().display()))?;

    print_statistics(&RecordStatistics::from_records(&records), Some(&file));
    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing up");
            signal_token.cancel();
        }
    });

    match crawl(config, cancel).await {
        Ok(outcome) if outcome.success => {
            tracing::info!(
                "Harvest completed: {} records ({} without details, {} duplicates, {} dropped, {} failed)",
                outcome.records_committed,
                outcome.details_missing,
                outcome.duplicates_skipped,
                outcome.items_dropped,
                outcome.items_failed
            );
            if outcome.profile_lost {
                tracing::warn!("Stopped early after losing the profile page; re-run with --append to continue");
            }
            Ok(())
        }
        Ok(outcome) => bail!(
            "Harvest produced no records ({} items loaded, {} failed)",
            outcome.items_loaded,
            outcome.items_failed
        ),
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
