//! Mock page source for testing.
//!
//! `MockSource` implements `PageSource` with scripted per-day pages,
//! allowing tests to run without network calls.
//!
//! # Usage
//!
//! ```rust,ignore
//! use subway_ingestion::{MockFailure, MockPage, MockSource};
//!
//! let mock = MockSource::new()
//!     .with_pages(day1, [1000, 1000])          // two full pages, then empty
//!     .with_script(day2, vec![MockPage::Fail(MockFailure::Transport)]);
//!
//! let rows = mock.fetch_page(&request).await?;
//! ```
//!
//! Pages past the end of a day's script are empty, which is how the real
//! API signals the end of a day.

use crate::{error::IngestionError, PageSource};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use subway_types::{DayKey, PageRequest, Record};

/// Failure kinds a mock page can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Behaves like a connection timeout.
    Transport,
    /// Behaves like a non-200 response with this status.
    Status(u16),
    /// Behaves like a body without the expected top-level key.
    Schema,
}

impl MockFailure {
    fn to_error(self, request: &PageRequest) -> IngestionError {
        match self {
            MockFailure::Transport => {
                IngestionError::Transport(format!("mock timeout for {}", request))
            }
            MockFailure::Status(status) => IngestionError::UnexpectedStatus {
                status,
                url: format!("mock://{}", request),
            },
            MockFailure::Schema => IngestionError::Schema("mock body without rows".into()),
        }
    }
}

/// One scripted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockPage {
    /// Return this many rows.
    Rows(usize),
    /// Fail every attempt.
    Fail(MockFailure),
    /// Fail the first `failures` attempts, then return `rows` rows.
    Flaky {
        failures: usize,
        failure: MockFailure,
        rows: usize,
    },
}

impl From<usize> for MockPage {
    fn from(rows: usize) -> Self {
        MockPage::Rows(rows)
    }
}

/// Mock page source for testing.
///
/// Stores the scripted pages and records every request it receives, so
/// tests can assert on exactly which windows were fetched and how many
/// fetches overlapped.
///
/// # Note on Cloning
///
/// Clones share the call log and concurrency counters.
#[derive(Default, Clone)]
pub struct MockSource {
    /// Scripted pages per day, in page order.
    pub pages: HashMap<DayKey, Vec<MockPage>>,

    /// Artificial latency per day, applied to every fetch of that day.
    pub delays: HashMap<DayKey, Duration>,

    calls: Arc<Mutex<Vec<PageRequest>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockSource {
    /// Create a new empty mock source. Every page of every day is empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a day as a list of page sizes (builder pattern).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mock = MockSource::new().with_pages(day, [1000, 500]);
    /// ```
    pub fn with_pages<I>(self, day: DayKey, sizes: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.with_script(day, sizes.into_iter().map(MockPage::Rows).collect())
    }

    /// Script a day page by page (builder pattern).
    pub fn with_script(mut self, day: DayKey, pages: Vec<MockPage>) -> Self {
        self.pages.insert(day, pages);
        self
    }

    /// Delay every fetch of a day (builder pattern).
    pub fn with_delay(mut self, day: DayKey, delay: Duration) -> Self {
        self.delays.insert(day, delay);
        self
    }

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<PageRequest> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Requests received for one day, in arrival order.
    pub fn calls_for(&self, day: DayKey) -> Vec<PageRequest> {
        self.calls()
            .into_iter()
            .filter(|request| request.day() == day)
            .collect()
    }

    /// Highest number of fetches that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// A row shaped like the real API's, numbered by its 1-based index.
    pub fn sample_record(day: DayKey, index: u32) -> Record {
        let row = json!({
            "USE_YMD": day.to_string(),
            "SBWY_ROUT_LN_NM": "2호선",
            "SBWY_STNS_NM": format!("역{}", index),
            "GTON_TNOPE": index * 10,
            "GTOFF_TNOPE": index * 9,
            "REG_YMD": day.to_string(),
        });
        match row {
            Value::Object(fields) => fields,
            _ => Record::new(),
        }
    }

    /// Record the request and return how many times it was seen before.
    fn log_call(&self, request: &PageRequest) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        let previous = calls.iter().filter(|c| *c == request).count();
        calls.push(*request);
        previous
    }

    fn respond(&self, request: &PageRequest, previous_attempts: usize) -> Result<Vec<Record>, IngestionError> {
        let page = ((request.start_index() - 1) / request.width()) as usize;
        let scripted = self
            .pages
            .get(&request.day())
            .and_then(|pages| pages.get(page))
            .copied();

        let rows = match scripted {
            None => 0,
            Some(MockPage::Rows(rows)) => rows,
            Some(MockPage::Fail(failure)) => return Err(failure.to_error(request)),
            Some(MockPage::Flaky {
                failures,
                failure,
                rows,
            }) => {
                if previous_attempts < failures {
                    return Err(failure.to_error(request));
                }
                rows
            }
        };

        Ok((0..rows as u32)
            .map(|offset| Self::sample_record(request.day(), request.start_index() + offset))
            .collect())
    }
}

impl PageSource for MockSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>, IngestionError> {
        let previous_attempts = self.log_call(request);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&request.day()) {
            tokio::time::sleep(*delay).await;
        }
        let result = self.respond(request, previous_attempts);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
