//! Result sink trait and output errors

use crate::record::VideoRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No records to write")]
    Empty,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Accumulates the records of a crawl
///
/// The crawl hands over each record once it is complete; persisting is the
/// sink's concern and happens after the crawl.
pub trait ResultSink: Send {
    /// Accepts one complete record
    fn accept(&mut self, record: VideoRecord) -> OutputResult<()>;

    /// Records accepted so far, in acceptance order
    fn records(&self) -> &[VideoRecord];

    fn len(&self) -> usize {
        self.records().len()
    }

    fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

/// Sink that only keeps records in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Vec<VideoRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_records(self) -> Vec<VideoRecord> {
        self.records
    }
}

impl ResultSink for MemorySink {
    fn accept(&mut self, record: VideoRecord) -> OutputResult<()> {
        self.records.push(record);
        Ok(())
    }

    fn records(&self) -> &[VideoRecord] {
        &self.records
    }
}
