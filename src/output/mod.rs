//! Output module for persisting harvested records
//!
//! This module handles:
//! - Accumulating records through the `ResultSink` trait
//! - Writing them to a CSV file (append or overwrite)
//! - Computing and displaying aggregate statistics

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::CsvSink;
pub use stats::{log_statistics, print_statistics, FileInfo, RecordStatistics};
pub use traits::{MemorySink, OutputError, OutputResult, ResultSink};
