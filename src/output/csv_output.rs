//! CSV result sink
//!
//! Columns are written in the fixed order of [`crate::record::COLUMNS`].
//! With append mode on and an existing non-empty file, rows are appended
//! without a second header; otherwise the file is overwritten with a header.

use crate::config::OutputConfig;
use crate::output::stats::{FileInfo, RecordStatistics};
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use crate::record::VideoRecord;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Accumulates records in memory and persists them to one CSV file
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    append: bool,
    records: Vec<VideoRecord>,
}

impl CsvSink {
    /// Creates a sink for the file described by the `[output]` section
    pub fn new(config: &OutputConfig) -> Self {
        Self::with_path(config.csv_path(), config.append)
    }

    pub fn with_path(path: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            path: path.into(),
            append,
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the accumulated records to disk
    ///
    /// The parent directory is created if needed. The in-memory records are
    /// left untouched whatever the outcome.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(OutputError)` - Nothing to write, or the file could not be written
    pub fn save(&self) -> OutputResult<PathBuf> {
        if self.records.is_empty() {
            return Err(OutputError::Empty);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let has_content = fs::metadata(&self.path)
            .map(|meta| meta.len() > 0)
            .unwrap_or(false);

        if self.append && has_content {
            debug!("Appending {} records to {}", self.records.len(), self.path.display());
            let file = OpenOptions::new().append(true).open(&self.path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            for record in &self.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        } else {
            debug!("Writing {} records to {}", self.records.len(), self.path.display());
            let mut writer = csv::Writer::from_path(&self.path)?;
            for record in &self.records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }

        info!("Saved {} records to {}", self.records.len(), self.path.display());
        Ok(self.path.clone())
    }

    /// Reads the records already present in the file
    ///
    /// A missing file yields no records.
    pub fn load_existing(&self) -> OutputResult<Vec<VideoRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<VideoRecord>, csv::Error>>()?;
        Ok(records)
    }

    /// Statistics over the records accumulated in memory
    pub fn stats(&self) -> RecordStatistics {
        RecordStatistics::from_records(&self.records)
    }

    /// Existence, size and modification time of the output file
    pub fn file_info(&self) -> OutputResult<FileInfo> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(FileInfo {
                path: self.path.clone(),
                exists: true,
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Utc>::from),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileInfo {
                path: self.path.clone(),
                exists: false,
                size: 0,
                modified: None,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Drops the records accumulated in memory
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl ResultSink for CsvSink {
    fn accept(&mut self, record: VideoRecord) -> OutputResult<()> {
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> &[VideoRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::COLUMNS;
    use tempfile::TempDir;

    fn record(id: &str, views: u64) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            url: format!("https://www.tiktok.com/@creator/video/{}", id),
            description: "caption, with \"quotes\"".to_string(),
            thumbnail_url: String::new(),
            view_count: views,
            like_count: 3,
            comment_count: 1,
            scraped_at: Utc::now(),
            account_username: "creator".to_string(),
        }
    }

    #[test]
    fn test_save_creates_directory_and_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("videos.csv");
        let mut sink = CsvSink::with_path(&path, false);
        sink.accept(record("1", 10)).unwrap();
        sink.accept(record("2", 20)).unwrap();

        assert_eq!(sink.save().unwrap(), path);

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], COLUMNS.join(","));
    }

    #[test]
    fn test_overwrite_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");

        let mut first = CsvSink::with_path(&path, false);
        first.accept(record("1", 10)).unwrap();
        first.accept(record("2", 20)).unwrap();
        first.save().unwrap();

        let mut second = CsvSink::with_path(&path, false);
        second.accept(record("3", 30)).unwrap();
        second.save().unwrap();

        let loaded = second.load_existing().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "3");
    }

    #[test]
    fn test_append_without_duplicate_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("videos.csv");

        let mut first = CsvSink::with_path(&path, true);
        first.accept(record("1", 10)).unwrap();
        first.save().unwrap();

        let mut second = CsvSink::with_path(&path, true);
        second.accept(record("2", 20)).unwrap();
        second.save().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("accountUsername").count(), 1);

        let loaded = second.load_existing().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].description, "caption, with \"quotes\"");
        assert_eq!(loaded[1].view_count, 20);
    }

    #[test]
    fn test_save_empty_is_error() {
        let dir = TempDir::new().unwrap();
        let sink = CsvSink::with_path(dir.path().join("videos.csv"), false);
        assert!(matches!(sink.save(), Err(OutputError::Empty)));
    }

    #[test]
    fn test_file_info_and_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = CsvSink::with_path(dir.path().join("videos.csv"), false);

        let info = sink.file_info().unwrap();
        assert!(!info.exists);
        assert_eq!(info.size, 0);
        assert!(sink.load_existing().unwrap().is_empty());

        sink.accept(record("1", 10)).unwrap();
        sink.save().unwrap();

        let info = sink.file_info().unwrap();
        assert!(info.exists);
        assert!(info.size > 0);
        assert!(info.modified.is_some());
    }

    #[test]
    fn test_stats_and_clear() {
        let mut sink = CsvSink::with_path("unused.csv", false);
        sink.accept(record("1", 10)).unwrap();
        sink.accept(record("2", 30)).unwrap();

        let stats = sink.stats();
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.avg_views, 20);

        sink.clear();
        assert!(sink.is_empty());
    }
}
