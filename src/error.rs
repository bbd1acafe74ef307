//! Failure taxonomy for the spreadsheet pipeline.
//!
//! None of these reach an HTTP client: `dataset::load_dataset` turns every
//! variant into an empty dataset and a log line.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source file not found: {}", path.display())]
    SourceUnavailable { path: PathBuf },

    #[error("unsupported source type: .{0} (supported: .xlsx, .xlsm, .xlsb, .xls, .ods, .csv)")]
    UnsupportedFormat(String),

    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("failed to read CSV: {0}")]
    Csv(String),

    #[error("malformed sheet layout: {0}")]
    MalformedLayout(String),
}

impl PipelineError {
    /// Missing input is the normal "nothing uploaded yet" state, not a fault.
    pub fn is_missing_source(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}
