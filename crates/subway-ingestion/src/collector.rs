//! Per-day pagination.
//!
//! [`collect_day`] walks one day's windows strictly in sequence:
//!
//! 1. Request `[1..size]`, then `[size+1..2*size]`, and so on
//! 2. Stop on the first empty page (natural end of data)
//! 3. Stop after `max_pages` pages (the day is then flagged as truncated)
//! 4. Stop on a failure that survived the retry budget
//!
//! Nothing escapes as an `Err`. Every outcome, including a failure, is a
//! [`DayResult`] so the coordinator can carry on with the other days.

use crate::config::CollectorConfig;
use crate::error::IngestionError;
use crate::PageSource;
use subway_types::{DayKey, PageRequest, Record};
use tokio_util::sync::CancellationToken;

/// Why a day stopped early.
#[derive(Debug, Clone)]
pub struct DayFailure {
    /// The window that failed, if the failure happened at a fetch.
    pub window: Option<PageRequest>,

    /// What went wrong.
    pub error: IngestionError,
}

impl std::fmt::Display for DayFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.window {
            Some(window) => write!(
                f,
                "rows {}-{}: {}",
                window.start_index(),
                window.end_index(),
                self.error
            ),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Everything one day task produced.
#[derive(Debug, Clone)]
pub struct DayResult {
    pub day: DayKey,

    /// Rows in arrival order (page order, then in-page order).
    pub records: Vec<Record>,

    /// Non-empty pages received.
    pub pages: u32,

    /// Set when pagination stopped at `max_pages` instead of an empty page.
    pub truncated: bool,

    /// Set when pagination stopped because of an error.
    pub failure: Option<DayFailure>,
}

impl DayResult {
    fn new(day: DayKey) -> Self {
        Self {
            day,
            records: Vec::new(),
            pages: 0,
            truncated: false,
            failure: None,
        }
    }

    /// A result for a day that never ran.
    pub(crate) fn failed(day: DayKey, error: IngestionError) -> Self {
        Self {
            failure: Some(DayFailure {
                window: None,
                error,
            }),
            ..Self::new(day)
        }
    }

    /// True when the day ended without an error.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Fetch every page of one day.
///
/// Pages are requested one after another, never overlapping. Once
/// `cancel` fires no new fetch starts; a fetch already running is allowed
/// to finish.
pub async fn collect_day<S>(
    source: &S,
    day: DayKey,
    config: &CollectorConfig,
    cancel: &CancellationToken,
) -> DayResult
where
    S: PageSource + ?Sized,
{
    let mut result = DayResult::new(day);

    for page in 0..config.max_pages {
        let request = match PageRequest::window(day, page, config.page_size) {
            Ok(request) => request,
            Err(e) => {
                result.failure = Some(DayFailure {
                    window: None,
                    error: e.into(),
                });
                return result;
            }
        };

        if cancel.is_cancelled() {
            tracing::debug!("{} cancelled before rows {}", day, request.start_index());
            result.failure = Some(DayFailure {
                window: Some(request),
                error: IngestionError::Cancelled,
            });
            return result;
        }

        match fetch_with_retry(source, &request, config, cancel).await {
            Ok(rows) if rows.is_empty() => {
                tracing::debug!("{} ended after {} pages", day, result.pages);
                return result;
            }
            Ok(rows) => {
                tracing::debug!("{} got {} rows", request, rows.len());
                result.pages += 1;
                result.records.extend(rows);
            }
            Err(error) => {
                tracing::warn!(
                    "{} rows {}-{} failed, keeping {} rows: {}",
                    day,
                    request.start_index(),
                    request.end_index(),
                    result.records.len(),
                    error
                );
                result.failure = Some(DayFailure {
                    window: Some(request),
                    error,
                });
                return result;
            }
        }
    }

    tracing::warn!(
        "{} hit the {} page limit; later rows were not fetched",
        day,
        config.max_pages
    );
    result.truncated = true;
    result
}

/// One window, retried on transient errors within the configured budget.
async fn fetch_with_retry<S>(
    source: &S,
    request: &PageRequest,
    config: &CollectorConfig,
    cancel: &CancellationToken,
) -> Result<Vec<Record>, IngestionError>
where
    S: PageSource + ?Sized,
{
    let mut attempt = 0;
    loop {
        match source.fetch_page(request).await {
            Ok(rows) => return Ok(rows),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let delay = config.backoff_for(attempt);
                tracing::info!(
                    "{} retry {}/{} in {:?}: {}",
                    request,
                    attempt,
                    config.max_retries,
                    delay,
                    e
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(IngestionError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}
