//! Error types for subway-types.

use thiserror::Error;

/// Errors that can occur when constructing or parsing types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// The end date lies before the start date.
    #[error("invalid range: end date {end} is before start date {start}")]
    InvalidRange { start: String, end: String },

    /// A page window with `start < 1` or `end < start`.
    #[error("invalid page window: {start}..{end}")]
    InvalidWindow { start: u32, end: u32 },

    /// A day key that is not a valid `YYYYMMDD` calendar date.
    #[error("invalid day key: {0}")]
    InvalidDayKey(String),
}
