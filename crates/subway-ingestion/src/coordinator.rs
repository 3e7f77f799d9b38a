//! Parallel ingestion across days.
//!
//! The [`Coordinator`] spawns one task per day. A semaphore caps how many
//! of them fetch at once, and finished [`DayResult`]s come back over a
//! channel in whatever order they complete. Only after every day reported
//! are the results re-ordered by day and merged, so the output never
//! depends on scheduling.

use crate::collector::{collect_day, DayFailure, DayResult};
use crate::config::IngestConfig;
use crate::error::IngestionError;
use crate::PageSource;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use subway_types::{Dataset, DayKey, NaiveDate};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;

/// Per-day failures of a run, ordered by day.
#[derive(Debug, Clone, Default)]
pub struct FailureReport {
    /// Number of distinct days the run attempted.
    pub attempted: usize,

    /// Days that stopped on an error, with the error.
    pub failures: Vec<(DayKey, DayFailure)>,

    /// Days that stopped at the page limit instead of an empty page.
    pub truncated: Vec<DayKey>,
}

impl FailureReport {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_days(&self) -> Vec<DayKey> {
        self.failures.iter().map(|(day, _)| *day).collect()
    }

    /// Log the outcome of every failed or truncated day.
    ///
    /// Called for every run, successful or not, so partial data loss is
    /// always visible in the logs.
    pub fn log_summary(&self) {
        if self.failures.is_empty() {
            tracing::info!("All {} days completed without errors", self.attempted);
        } else {
            tracing::warn!(
                "{} of {} days failed:",
                self.failures.len(),
                self.attempted
            );
            for (day, failure) in &self.failures {
                tracing::warn!("  {} - {}", day, failure);
            }
        }
        for day in &self.truncated {
            tracing::warn!("  {} - stopped at the page limit", day);
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} days failed", self.failures.len(), self.attempted)?;
        for (day, failure) in &self.failures {
            write!(f, "\n  {}: {}", day, failure)?;
        }
        Ok(())
    }
}

/// Result of a run that produced at least one record.
#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    /// All records, ordered by day then arrival.
    pub dataset: Dataset,

    /// Days that failed, possibly none.
    pub report: FailureReport,
}

/// Runs a day collector for every requested day on a bounded pool.
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = Coordinator::new(MockSource::new(), IngestConfig::default())?;
/// let outcome = coordinator.run(&days).await?;
/// ```
pub struct Coordinator<S> {
    source: Arc<S>,
    config: IngestConfig,
}

impl<S> Coordinator<S>
where
    S: PageSource + 'static,
{
    /// Create a coordinator owning `source`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Config`] if the config fails validation.
    pub fn new(source: S, config: IngestConfig) -> Result<Self, IngestionError> {
        Self::with_shared_source(Arc::new(source), config)
    }

    /// Create a coordinator over a source that the caller keeps a handle to.
    pub fn with_shared_source(source: Arc<S>, config: IngestConfig) -> Result<Self, IngestionError> {
        config.validate()?;
        Ok(Self { source, config })
    }

    /// Ingest every day from `start` to `end`, inclusive.
    ///
    /// # Errors
    ///
    /// - [`IngestionError::InvalidInput`] if `end` is before `start`; no
    ///   request is made
    /// - [`IngestionError::TotalFailure`] if no day produced a record
    pub async fn run_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<IngestionOutcome, IngestionError> {
        let days = DayKey::range(start, end)?;
        self.run(&days).await
    }

    /// Ingest the given days.
    pub async fn run(&self, days: &[DayKey]) -> Result<IngestionOutcome, IngestionError> {
        self.run_with_cancel(days, CancellationToken::new()).await
    }

    /// Ingest the given days, stopping early once `cancel` fires.
    ///
    /// After cancellation no new day starts and running days stop before
    /// their next page. Days cut short are reported as
    /// [`IngestionError::Cancelled`]; their partial rows are still merged.
    pub async fn run_with_cancel(
        &self,
        days: &[DayKey],
        cancel: CancellationToken,
    ) -> Result<IngestionOutcome, IngestionError> {
        let results = self.collect_all(days, cancel).await;
        let attempted = results.len();

        let mut report = FailureReport {
            attempted,
            ..FailureReport::default()
        };
        let mut batches = Vec::with_capacity(attempted);
        for (day, result) in results {
            if let Some(failure) = result.failure {
                report.failures.push((day, failure));
            }
            if result.truncated {
                report.truncated.push(day);
            }
            batches.push((day, result.records));
        }

        let dataset = Dataset::merge_days(batches);
        report.log_summary();

        if dataset.is_empty() {
            return Err(IngestionError::TotalFailure { days: attempted });
        }

        tracing::info!(
            "Collected {} rows from {} days ({} failed)",
            dataset.len(),
            attempted,
            report.len()
        );
        Ok(IngestionOutcome { dataset, report })
    }

    /// Run every day and gather exactly one result per distinct day.
    async fn collect_all(
        &self,
        days: &[DayKey],
        cancel: CancellationToken,
    ) -> BTreeMap<DayKey, DayResult> {
        let unique: BTreeSet<DayKey> = days.iter().copied().collect();
        if unique.len() != days.len() {
            tracing::debug!("Dropped {} duplicate days", days.len() - unique.len());
        }
        let total = unique.len();

        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<DayResult>();
        let mut handles = Vec::with_capacity(total);

        tracing::info!(
            "Fetching {} days with {} workers",
            total,
            self.config.workers
        );

        for &day in &unique {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let collector = self.config.collector.clone();
            let cancel = cancel.clone();
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Err(_) => DayResult::failed(
                        day,
                        IngestionError::TaskFailed("worker pool closed".into()),
                    ),
                    Ok(_) if cancel.is_cancelled() => {
                        DayResult::failed(day, IngestionError::Cancelled)
                    }
                    Ok(_permit) => collect_day(source.as_ref(), day, &collector, &cancel).await,
                };
                // The receiver only goes away if the run itself was dropped
                let _ = tx.send(result);
            }));
        }
        drop(tx);

        let mut results = BTreeMap::new();
        while let Some(result) = rx.recv().await {
            tracing::info!(
                "[{}/{}] {} done: {} rows{}",
                results.len() + 1,
                total,
                result.day,
                result.records.len(),
                if result.is_complete() { "" } else { " (failed)" }
            );
            results.insert(result.day, result);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Day task ended abnormally: {}", e);
            }
        }

        // A task that panicked never sent its result
        for day in unique {
            results.entry(day).or_insert_with(|| {
                DayResult::failed(
                    day,
                    IngestionError::TaskFailed("task ended without a result".into()),
                )
            });
        }

        results
    }
}
