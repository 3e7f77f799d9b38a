//! Error types for sink operations.

use thiserror::Error;

/// Errors that can occur when writing or reading tabular files.
#[derive(Debug, Error)]
pub enum SinkError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Refused to write a table with no rows.
    #[error("dataset is empty; nothing to write")]
    EmptyDataset,

    /// The file lacks columns that downstream consumers rely on.
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A row has a value downstream consumers cannot interpret.
    #[error("invalid row {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}
