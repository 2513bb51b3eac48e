//! Aggregate statistics over harvested records
//!
//! This module computes per-field totals and averages and displays them,
//! together with details about the CSV file on disk.

use crate::record::VideoRecord;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Aggregate statistics for a set of records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStatistics {
    /// Number of records
    pub total_videos: u64,

    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,

    /// Integer averages; zero when there are no records
    pub avg_views: u64,
    pub avg_likes: u64,
    pub avg_comments: u64,
}

impl RecordStatistics {
    /// Computes statistics over `records`
    pub fn from_records(records: &[VideoRecord]) -> Self {
        let total_videos = records.len() as u64;
        let total_views = records.iter().map(|r| r.view_count).fold(0u64, u64::saturating_add);
        let total_likes = records.iter().map(|r| r.like_count).fold(0u64, u64::saturating_add);
        let total_comments = records
            .iter()
            .map(|r| r.comment_count)
            .fold(0u64, u64::saturating_add);

        let average = |total: u64| total.checked_div(total_videos).unwrap_or(0);

        Self {
            total_videos,
            total_views,
            total_likes,
            total_comments,
            avg_views: average(total_views),
            avg_likes: average(total_likes),
            avg_comments: average(total_comments),
        }
    }
}

/// Details about the output file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub exists: bool,

    /// Size in bytes; zero when the file does not exist
    pub size: u64,

    pub modified: Option<DateTime<Utc>>,
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `file` - The file they were read from, when known
pub fn print_statistics(stats: &RecordStatistics, file: Option<&FileInfo>) {
    println!("=== Harvest Statistics ===\n");

    if let Some(file) = file {
        println!("File:");
        println!("  Path: {}", file.path.display());
        if file.exists {
            println!("  Size: {} bytes", file.size);
            if let Some(modified) = file.modified {
                println!("  Modified: {}", modified.to_rfc3339());
            }
        } else {
            println!("  (does not exist)");
        }
        println!();
    }

    println!("Overview:");
    println!("  Total videos: {}", stats.total_videos);
    println!();

    println!("Totals:");
    println!("  Views: {}", stats.total_views);
    println!("  Likes: {}", stats.total_likes);
    println!("  Comments: {}", stats.total_comments);
    println!();

    println!("Averages per video:");
    println!("  Views: {}", stats.avg_views);
    println!("  Likes: {}", stats.avg_likes);
    println!("  Comments: {}", stats.avg_comments);
}

/// Emits the statistics as a structured log event
pub fn log_statistics(stats: &RecordStatistics) {
    tracing::info!(
        total_videos = stats.total_videos,
        total_views = stats.total_views,
        total_likes = stats.total_likes,
        total_comments = stats.total_comments,
        avg_views = stats.avg_views,
        avg_likes = stats.avg_likes,
        avg_comments = stats.avg_comments,
        "Harvest statistics"
    );
}
