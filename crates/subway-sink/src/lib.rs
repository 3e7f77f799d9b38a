//! subway-sink: Tabular storage for ingested subway ridership.
//!
//! The sink is the hand-off point between ingestion and the downstream
//! cleaning and analysis steps, which read the file by fixed column names.
//!
//! # Overview
//!
//! - [`write_dataset`] writes a [`Dataset`](subway_types::Dataset) as UTF-8
//!   CSV, replacing any existing file atomically (temp file, then rename).
//! - [`read_dataset`] reads a file back as untyped rows.
//! - [`read_ridership`] reads it through the downstream schema
//!   ([`RawRidership`]) after [`check_columns`] confirms every column is
//!   present.
//!
//! # Example
//!
//! ```rust,no_run
//! use subway_sink::{read_ridership, write_dataset};
//! use subway_types::Dataset;
//!
//! fn save(dataset: &Dataset) -> Result<(), subway_sink::SinkError> {
//!     write_dataset(dataset, "data/subway_raw.csv")?;
//!     let rows = read_ridership("data/subway_raw.csv")?;
//!     println!("{} rows, first station {}", rows.len(), rows[0].station);
//!     Ok(())
//! }
//! ```
//!
//! # Column Contract
//!
//! The header is the source's own field order. Downstream code depends on
//! [`RAW_COLUMNS`] being present under exactly those names.

mod error;
mod reader;
mod schema;
mod writer;

pub use error::SinkError;
pub use reader::{check_columns, read_column, read_dataset, read_ridership};
pub use schema::{RawRidership, RAW_COLUMNS};
pub use writer::{write_dataset, write_rows};
