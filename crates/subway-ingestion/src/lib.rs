//! # subway-ingestion
//!
//! Parallel, paginated ingestion of daily subway ridership from the Seoul
//! Open Data API.
//!
//! The crate is layered leaves-first:
//!
//! - [`PageSource`]: one bounded request for one day's index window.
//!   [`SeoulOpenApiSource`] is the production implementation; [`MockSource`]
//!   serves scripted pages for tests.
//! - [`collect_day`]: walks a single day page by page until an empty page,
//!   the page bound, or a failure. Failures become part of the [`DayResult`].
//! - [`Coordinator`]: runs one collector per day on a bounded worker pool and
//!   merges the results by day into a [`Dataset`](subway_types::Dataset).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use subway_ingestion::{Coordinator, IngestConfig, SeoulOpenApiSource, SourceConfig};
//! use subway_types::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = SeoulOpenApiSource::new(SourceConfig::from_env()?)?;
//!     let coordinator = Coordinator::new(source, IngestConfig::default().with_workers(6))?;
//!
//!     let outcome = coordinator
//!         .run_range(
//!             NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!             NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//!         )
//!         .await?;
//!
//!     println!("{} rows, {} failed days", outcome.dataset.len(), outcome.report.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Testing with MockSource
//!
//! ```rust
//! use subway_ingestion::{collect_day, CancellationToken, CollectorConfig, MockSource};
//! use subway_types::DayKey;
//!
//! #[tokio::main]
//! async fn main() {
//!     let day = DayKey::from_ymd(2024, 1, 1).unwrap();
//!     let mock = MockSource::new().with_pages(day, [1000, 200]);
//!
//!     let config = CollectorConfig::default();
//!     let result = collect_day(&mock, day, &config, &CancellationToken::new()).await;
//!     assert_eq!(result.records.len(), 1200);
//!     assert!(result.is_complete());
//! }
//! ```
//!
//! ## Failure Policy
//!
//! A failing page halts pagination for its day only. The records gathered
//! before the failure are kept and the failure is listed in the run's
//! [`FailureReport`]. A run fails as a whole only when no day produced any
//! record.

mod api_client;
mod collector;
pub mod config;
mod coordinator;
pub mod error;
mod geocode;
mod mock;

// Re-export our types
pub use api_client::SeoulOpenApiSource;
pub use collector::{collect_day, DayFailure, DayResult};
pub use config::{CollectorConfig, IngestConfig, SourceConfig};
pub use coordinator::{Coordinator, FailureReport, IngestionOutcome};
pub use error::IngestionError;
pub use geocode::{locate_stations, Coordinates, Geocoder, KakaoGeocoder, StationCoordinates};
pub use mock::{MockFailure, MockPage, MockSource};

// Re-export the cancellation token so callers don't need tokio-util directly.
pub use tokio_util::sync::CancellationToken;

use subway_types::{PageRequest, Record};

/// A paginated remote source of raw ridership rows.
///
/// This trait uses native async syntax (Rust 1.75+) rather than
/// `async_trait`.
///
/// ## Contract
///
/// - One call performs at most one outbound request.
/// - No retries happen inside the source. Retry policy belongs to
///   [`collect_day`].
/// - An empty vector means the window holds no data.
///
/// ## Implementors
///
/// - [`SeoulOpenApiSource`]: Production implementation over HTTP
/// - [`MockSource`]: Test implementation with scripted pages
///
/// ## Sharing
///
/// One source is shared read-only by every day task of a run through an
/// `Arc`, so it must be usable from several tasks at once.
pub trait PageSource: Send + Sync {
    /// Fetch the rows of a single window, in source order.
    ///
    /// # Errors
    ///
    /// - [`IngestionError::Transport`] on connection failure or timeout
    /// - [`IngestionError::UnexpectedStatus`] on a non-200 response
    /// - [`IngestionError::Schema`] when the body lacks the expected shape
    fn fetch_page(
        &self,
        request: &PageRequest,
    ) -> impl std::future::Future<Output = Result<Vec<Record>, IngestionError>> + Send;
}
