//! Configuration for the ingestion layer.
//!
//! Configuration is split by who consumes it:
//! - [`SourceConfig`] is handed to [`SeoulOpenApiSource`](crate::SeoulOpenApiSource)
//!   and describes the remote endpoint and its fixed filters.
//! - [`CollectorConfig`] governs pagination and retry for one day.
//! - [`IngestConfig`] adds the worker-pool size for the coordinator.
//!
//! Every struct has a `validate()` that is called once at construction of
//! the component that owns it, so bad values fail at startup rather than
//! midway through a run.
//!
//! # Environment Variables
//!
//! - `SEOUL_OPEN_API_KEY`: API key for the Seoul Open Data portal (required)
//! - `KAKAO_API_KEY`: REST key for station geocoding (only for `locate`)

use crate::error::IngestionError;
use std::env;
use std::time::Duration;
use url::Url;

/// Default endpoint of the Seoul Open Data API.
pub const DEFAULT_BASE_URL: &str = "http://openapi.seoul.go.kr:8088";

/// Resource name for per-station daily card ridership.
pub const RESOURCE_NAME: &str = "CardSubwayStatsNew";

/// Environment variable holding the Seoul Open Data API key.
pub const API_KEY_ENV: &str = "SEOUL_OPEN_API_KEY";

/// Environment variable holding the Kakao REST API key.
pub const KAKAO_KEY_ENV: &str = "KAKAO_API_KEY";

/// Rows requested per page. The API caps a single call at 1000 rows.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Upper bound on pages per day.
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Default worker-pool size.
pub const DEFAULT_WORKERS: usize = 8;

/// Remote source parameters.
#[derive(Clone)]
pub struct SourceConfig {
    /// Base endpoint, without trailing path.
    pub base_url: Url,

    /// API key, embedded as the first path segment.
    pub api_key: String,

    /// Response format segment. Only `json` is decoded.
    pub format: String,

    /// Optional line filter (e.g. "2호선"). Empty means all lines.
    pub route: String,

    /// Optional station filter. Empty means all stations.
    pub station: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

// Hand-written so the key never lands in logs.
impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("format", &self.format)
            .field("route", &self.route)
            .field("station", &self.station)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SourceConfig {
    /// Create a config for the public endpoint with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            api_key: api_key.into(),
            format: "json".to_string(),
            route: String::new(),
            station: String::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Load the API key from `SEOUL_OPEN_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Config`] if the variable is unset or blank.
    pub fn from_env() -> Result<Self, IngestionError> {
        let key = env::var(API_KEY_ENV)
            .map_err(|_| IngestionError::Config(format!("{} is not set", API_KEY_ENV)))?;
        let config = Self::new(key.trim());
        config.validate()?;
        Ok(config)
    }

    /// Point the source at another endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, IngestionError> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| IngestionError::Config(format!("invalid base url {}: {}", base_url, e)))?;
        Ok(self)
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn with_station(mut self, station: impl Into<String>) -> Self {
        self.station = station.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that the config can produce well-formed requests.
    pub fn validate(&self) -> Result<(), IngestionError> {
        if self.api_key.trim().is_empty() {
            return Err(IngestionError::Config("API key is empty".into()));
        }
        if self.api_key.contains('/') {
            return Err(IngestionError::Config("API key must not contain '/'".into()));
        }
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(IngestionError::Config(format!(
                "unsupported scheme: {}",
                self.base_url.scheme()
            )));
        }
        if self.format != "json" {
            return Err(IngestionError::Config(format!(
                "unsupported response format: {}",
                self.format
            )));
        }
        if self.timeout.is_zero() {
            return Err(IngestionError::Config("timeout must be positive".into()));
        }
        Ok(())
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

/// Pagination and retry policy for a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Rows requested per page.
    pub page_size: u32,

    /// Maximum pages fetched for one day.
    pub max_pages: u32,

    /// Extra attempts for a transient page failure. Zero halts the day on
    /// the first failure.
    pub max_retries: u32,

    /// Base delay before a retry, doubled on every further attempt.
    pub retry_backoff: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl CollectorConfig {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.retry_backoff.saturating_mul(factor)
    }

    pub fn validate(&self) -> Result<(), IngestionError> {
        if self.page_size == 0 {
            return Err(IngestionError::Config("page size must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(IngestionError::Config("max pages must be at least 1".into()));
        }
        if self.page_size.checked_mul(self.max_pages).is_none() {
            return Err(IngestionError::Config(
                "page size times max pages overflows the index range".into(),
            ));
        }
        Ok(())
    }
}

/// Coordinator settings for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Per-day pagination policy.
    pub collector: CollectorConfig,

    /// Maximum number of days fetched concurrently.
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            collector: CollectorConfig::default(),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl IngestConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_collector(mut self, collector: CollectorConfig) -> Self {
        self.collector = collector;
        self
    }

    pub fn validate(&self) -> Result<(), IngestionError> {
        if self.workers == 0 {
            return Err(IngestionError::Config("worker count must be at least 1".into()));
        }
        self.collector.validate()
    }
}
