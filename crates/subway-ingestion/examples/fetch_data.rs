//! Quick check against the live API: fetch one week and dump a summary.
//!
//! Run with: SEOUL_OPEN_API_KEY=... cargo run -p subway-ingestion --example fetch_data

use subway_ingestion::{Coordinator, IngestConfig, SeoulOpenApiSource, SourceConfig};
use subway_types::NaiveDate;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Seoul Subway Ridership Fetch Test ===\n");

    let source = SeoulOpenApiSource::new(SourceConfig::from_env()?)?;
    let coordinator = Coordinator::new(source, IngestConfig::default().with_workers(4))?;

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad start date")?;
    let end = NaiveDate::from_ymd_opt(2024, 1, 7).ok_or("bad end date")?;

    match coordinator.run_range(start, end).await {
        Ok(outcome) => {
            println!("   Success! Got {} rows.", outcome.dataset.len());
            println!("   Columns: {:?}", outcome.dataset.columns());
            println!("   First 5 rows:");
            for row in outcome.dataset.iter().take(5) {
                println!("     - {:?}", row);
            }
            if !outcome.report.is_empty() {
                println!("\n   {}", outcome.report);
            }
        }
        Err(e) => {
            println!("   Error: {}", e);
        }
    }

    Ok(())
}
