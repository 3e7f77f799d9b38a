//! subway: command-line driver for subway ridership ingestion.
//!
//! This binary wires the ingestion engine to the sink:
//!
//! - `subway fetch` downloads every day in a range and writes one CSV
//! - `subway locate` geocodes station names from a CSV column
//!
//! Exit status is non-zero only when configuration is invalid or no day
//! produced any data. Failed days are listed as warnings.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use subway_ingestion::config::{
    API_KEY_ENV, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, KAKAO_KEY_ENV,
};
use subway_ingestion::{
    locate_stations, CancellationToken, CollectorConfig, Coordinator, IngestConfig,
    KakaoGeocoder, SeoulOpenApiSource, SourceConfig, StationCoordinates,
};
use subway_types::{DayKey, NaiveDate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "subway=info,subway_ingestion=info,subway_sink=info";

#[derive(Debug, Parser)]
#[command(name = "subway", version, about = "Seoul subway ridership ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download daily ridership for a date range into a CSV file
    Fetch(FetchArgs),
    /// Look up coordinates for station names
    Locate(LocateArgs),
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// First day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Output CSV path
    #[arg(long, short)]
    output: PathBuf,

    /// Days fetched concurrently
    #[arg(long, default_value_t = 6)]
    workers: usize,

    /// Rows per request
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Maximum pages per day
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    /// Extra attempts for a transient page failure
    #[arg(long, default_value_t = 0)]
    max_retries: u32,

    /// Base delay before a retry, in milliseconds
    #[arg(long, default_value_t = 500)]
    retry_backoff_ms: u64,

    /// Line filter
    #[arg(long, default_value = "")]
    route: String,

    /// Station filter
    #[arg(long, default_value = "")]
    station: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Override the API endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Seoul Open Data API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: String,
}

#[derive(Debug, Args)]
struct LocateArgs {
    /// CSV file with station names
    #[arg(long, short)]
    input: PathBuf,

    /// Output CSV path (station,lat,lng)
    #[arg(long, short)]
    output: PathBuf,

    /// Column holding station names
    #[arg(long, default_value = "station")]
    column: String,

    /// Pause between lookups, in milliseconds
    #[arg(long, default_value_t = 200)]
    delay_ms: u64,

    /// Kakao REST API key
    #[arg(long, env = KAKAO_KEY_ENV, hide_env_values = true)]
    kakao_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Fetch(args) => fetch(args).await,
        Command::Locate(args) => locate(args).await,
    }
}

impl FetchArgs {
    fn source_config(&self) -> anyhow::Result<SourceConfig> {
        let mut config = SourceConfig::new(self.api_key.trim())
            .with_route(self.route.clone())
            .with_station(self.station.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn ingest_config(&self) -> anyhow::Result<IngestConfig> {
        let collector = CollectorConfig::default()
            .with_page_size(self.page_size)
            .with_max_pages(self.max_pages)
            .with_retries(
                self.max_retries,
                Duration::from_millis(self.retry_backoff_ms),
            );
        let config = IngestConfig::default()
            .with_workers(self.workers)
            .with_collector(collector);
        config.validate()?;
        Ok(config)
    }
}

async fn fetch(args: FetchArgs) -> anyhow::Result<()> {
    // Validate everything before the first request goes out
    let days = DayKey::range(args.start, args.end)?;
    let source = SeoulOpenApiSource::new(args.source_config()?)?;
    let coordinator = Coordinator::new(source, args.ingest_config()?)?;

    tracing::info!(
        "Fetching {} days ({} to {}) into {}",
        days.len(),
        args.start,
        args.end,
        args.output.display()
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing in-flight pages and stopping");
            on_signal.cancel();
        }
    });

    let outcome = coordinator.run_with_cancel(&days, cancel).await?;

    subway_sink::write_dataset(&outcome.dataset, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    if outcome.report.is_empty() {
        tracing::info!("Done: {} rows", outcome.dataset.len());
    } else {
        tracing::warn!(
            "Done with gaps: {} rows, {} failed days ({:?})",
            outcome.dataset.len(),
            outcome.report.len(),
            outcome
                .report
                .failed_days()
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
        );
    }
    Ok(())
}

async fn locate(args: LocateArgs) -> anyhow::Result<()> {
    let geocoder = KakaoGeocoder::new(args.kakao_key.trim())?;
    let names = subway_sink::read_column(&args.input, &args.column)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let located = locate_stations(&geocoder, names, Duration::from_millis(args.delay_ms)).await;
    subway_sink::write_rows(&StationCoordinates::COLUMNS, &located, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}
