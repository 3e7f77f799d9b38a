//! subway-types: Shared data structures for subway ridership ingestion
//!
//! This crate defines the types passed between the ingestion engine and the
//! sink:
//! - [`DayKey`] - A calendar day rendered as `YYYYMMDD`, the unit of parallel work
//! - [`PageRequest`] - One 1-based, inclusive index window for a day
//! - [`Record`] - A raw row, kept in the source's field order
//! - [`Dataset`] - All rows of a run, ordered by day then arrival
//!
//! # Example
//!
//! ```rust
//! use subway_types::{DayKey, NaiveDate, PageRequest};
//!
//! let days = DayKey::range(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
//! ).unwrap();
//! assert_eq!(days.len(), 3);
//!
//! let first = PageRequest::window(days[0], 0, 1000).unwrap();
//! assert_eq!((first.start_index(), first.end_index()), (1, 1000));
//! ```

mod day;
mod error;
mod page;
mod record;

pub use day::DayKey;
pub use error::TypeError;
pub use page::PageRequest;
pub use record::{Dataset, Record};

// Re-export chrono::NaiveDate for convenience
pub use chrono::NaiveDate;
