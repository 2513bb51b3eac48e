//! Integration tests for the harvest pipeline
//!
//! These tests replay a scripted profile feed through the snapshot browser
//! backend and check the full cycle: pagination, extraction, deduplication
//! and CSV output.

use reel_harvest::browser::{SnapshotLauncher, SnapshotSite};
use reel_harvest::config::Config;
use reel_harvest::crawler::crawl_with;
use reel_harvest::output::{CsvSink, RecordStatistics};
use reel_harvest::HarvestError;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const PROFILE: &str = "https://www.tiktok.com/@creator";

/// Creates a test configuration with every delay disabled
fn create_test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.target.username = "@creator".to_string();
    config.crawl.max_items = 10;
    config.crawl.scroll_delay_ms = 0;
    config.crawl.scroll_settle_ms = 0;
    config.crawl.extraction_delay_ms = 0;
    config.crawl.navigation_settle_ms = 0;
    config.crawl.max_retries = 1;
    config.crawl.retry_base_delay_ms = 0;
    config.rate_limit.min_delay_ms = 0;
    config.rate_limit.max_delay_ms = 0;
    config.output.directory = output_dir.to_path_buf();
    config
}

fn item(video: u32, views: Option<&str>) -> String {
    let views = views
        .map(|v| format!(r#"<strong data-e2e="video-views">{}</strong>"#, v))
        .unwrap_or_default();
    format!(
        r#"<div data-e2e="user-post-item">
             <a href="/@creator/video/{video}?is_from_webapp=1&sender_device=pc">
               <img data-e2e="video-cover" src="https://p16-sign.tiktokcdn.com/{video}.jpeg">
               {views}
             </a>
           </div>"#
    )
}

fn detail(likes: &str, comments: &str) -> String {
    format!(
        r#"<div>
             <h1 data-e2e="browse-video-desc">A  caption
               over two lines</h1>
             <strong data-e2e="browse-like-count">{likes}</strong>
             <strong data-e2e="browse-comment-count">{comments}</strong>
           </div>"#
    )
}

/// Seven grid items revealed in three scroll stages (3, 6, 7)
///
/// Item 6 links to the same video as item 4 and item 3 has no view counter.
fn create_test_site() -> SnapshotSite {
    let items = [
        item(101, Some("1.2K")),
        item(102, Some("15")),
        item(103, None),
        item(104, Some("2M")),
        item(105, Some("980")),
        item(104, Some("2M")),
        item(107, Some("3.4K")),
    ];
    let stage = |n: usize| items[..n].concat();

    let mut site = SnapshotSite::new().with_feed(PROFILE, vec![stage(3), stage(6), stage(7)]);
    for video in [101, 102, 103, 104, 105, 107] {
        site = site.with_page(
            format!("{}/video/{}", PROFILE, video),
            detail(&format!("{}", video), "1,234"),
        );
    }
    site
}

#[tokio::test]
async fn test_full_harvest_writes_deduplicated_csv() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let launcher = SnapshotLauncher::new(create_test_site());

    let outcome = crawl_with(&config, &launcher, CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.items_loaded, 7);
    assert_eq!(outcome.records_committed, 6);
    assert_eq!(outcome.duplicates_skipped, 1);
    assert_eq!(outcome.items_failed, 0);

    let sink = CsvSink::new(&config.output);
    let records = sink.load_existing().unwrap();
    assert_eq!(records.len(), 6);

    let first = &records[0];
    assert_eq!(first.id, "101");
    assert_eq!(first.url, format!("{}/video/101", PROFILE));
    assert_eq!(first.view_count, 1_200);
    assert_eq!(first.like_count, 101);
    assert_eq!(first.comment_count, 1_234);
    assert_eq!(first.description, "A caption over two lines");
    assert_eq!(first.thumbnail_url, "https://p16-sign.tiktokcdn.com/101.jpeg");
    assert_eq!(first.account_username, "creator");

    // No view counter on the grid item
    assert_eq!(records[2].id, "103");
    assert_eq!(records[2].view_count, 0);

    assert_eq!(records[3].view_count, 2_000_000);

    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["101", "102", "103", "104", "105", "107"]);

    let stats = RecordStatistics::from_records(&records);
    assert_eq!(stats.total_videos, 6);
    assert_eq!(stats.total_comments, 6 * 1_234);
}

#[tokio::test]
async fn test_max_items_limits_harvest() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawl.max_items = 4;
    let launcher = SnapshotLauncher::new(create_test_site());

    let outcome = crawl_with(&config, &launcher, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.items_loaded, 6);
    assert_eq!(outcome.records_committed, 4);
    assert_eq!(CsvSink::new(&config.output).load_existing().unwrap().len(), 4);
}

#[tokio::test]
async fn test_append_mode_skips_harvested_items() {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.output.append = true;

    let first = crawl_with(
        &config,
        &SnapshotLauncher::new(create_test_site()),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(first.records_committed, 6);

    let second = crawl_with(
        &config,
        &SnapshotLauncher::new(create_test_site()),
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert!(!second.success);
    assert_eq!(second.records_committed, 0);
    assert_eq!(second.duplicates_skipped, 7);

    let content = std::fs::read_to_string(config.output.csv_path()).unwrap();
    assert_eq!(content.matches("accountUsername").count(), 1);
    assert_eq!(CsvSink::new(&config.output).load_existing().unwrap().len(), 6);
}

#[tokio::test]
async fn test_missing_profile() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let site = SnapshotSite::new().with_feed(
        PROFILE,
        vec!["<main><p>User not found</p></main>".to_string()],
    );

    let result = crawl_with(&config, &SnapshotLauncher::new(site), CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(HarvestError::ProfileNotFound { ref username }) if username == "creator"
    ));
    assert!(!config.output.csv_path().exists());
}

#[tokio::test]
async fn test_profile_without_items() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let site = SnapshotSite::new().with_feed(PROFILE, vec!["<main></main>".to_string()]);

    let result = crawl_with(&config, &SnapshotLauncher::new(site), CancellationToken::new()).await;

    assert!(matches!(result, Err(HarvestError::NoItems { .. })));
}

#[tokio::test]
async fn test_unreachable_details_keep_grid_fields() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let site = SnapshotSite::new()
        .with_feed(PROFILE, vec![[item(1, Some("5")), item(2, Some("6"))].concat()])
        .with_page(format!("{}/video/2", PROFILE), detail("7", "8"));

    let outcome = crawl_with(&config, &SnapshotLauncher::new(site), CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.items_failed, 0);
    assert_eq!(outcome.details_missing, 1);
    assert_eq!(outcome.records_committed, 2);

    let records = CsvSink::new(&config.output).load_existing().unwrap();
    assert_eq!(records.len(), 2);

    // Grid fields only
    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].view_count, 5);
    assert_eq!(records[0].thumbnail_url, "https://p16-sign.tiktokcdn.com/1.jpeg");
    assert_eq!(records[0].description, "");
    assert_eq!(records[0].like_count, 0);
    assert_eq!(records[0].comment_count, 0);

    assert_eq!(records[1].id, "2");
    assert_eq!(records[1].like_count, 7);
}
