//! Error types for the ingestion layer.
//!
//! Page-level failures (`Transport`, `UnexpectedStatus`, `Schema`) are
//! values carried inside a day's result; they never abort other days. Only
//! `InvalidInput`, `Config` and `TotalFailure` end a run.

use subway_types::TypeError;
use thiserror::Error;

/// Errors that can occur during data ingestion.
///
/// External errors (reqwest, serde_json) are converted into owned strings
/// immediately so the enum stays `Clone` and can be stored in reports.
#[derive(Debug, Clone, Error)]
pub enum IngestionError {
    /// Connection failure, timeout, or body read error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The source answered with a non-success status code.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The body decoded but does not have the expected shape.
    #[error("schema error: {0}")]
    Schema(String),

    /// Configuration errors (e.g., missing env vars, zero workers).
    #[error("config error: {0}")]
    Config(String),

    /// Invalid input (e.g., reversed date range).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    /// The run was cancelled before this unit of work finished.
    #[error("cancelled")]
    Cancelled,

    /// A day task stopped without reporting a result.
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// No day produced any record.
    #[error("ingestion failed: none of {days} days produced records")]
    TotalFailure { days: usize },
}

impl IngestionError {
    /// Whether the same request may succeed if sent again.
    ///
    /// Transport and status errors are transient. A schema error means the
    /// source broke its contract and repeating the call will not help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IngestionError::Transport(_) | IngestionError::UnexpectedStatus { .. }
        )
    }
}

// Convert from reqwest::Error (direct API calls) to our error type.
// The URL is stripped because the API key is part of the request path.
// Status codes are checked explicitly by the callers before decoding.
impl From<reqwest::Error> for IngestionError {
    #[inline]
    fn from(err: reqwest::Error) -> Self {
        IngestionError::Transport(err.without_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(IngestionError::Transport("timeout".into()).is_retryable());
        assert!(IngestionError::UnexpectedStatus {
            status: 503,
            url: "/x".into()
        }
        .is_retryable());
        assert!(!IngestionError::Schema("missing key".into()).is_retryable());
        assert!(!IngestionError::Cancelled.is_retryable());
    }

    #[test]
    fn test_from_type_error() {
        let err: IngestionError = TypeError::InvalidDayKey("x".into()).into();
        assert!(matches!(err, IngestionError::InvalidInput(_)));
    }
}
