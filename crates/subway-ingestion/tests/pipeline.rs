//! End-to-end runs of the coordinator over scripted and HTTP-mocked sources.

use serde_json::json;
use std::sync::Arc;
use subway_ingestion::{
    CollectorConfig, Coordinator, IngestConfig, IngestionError, MockFailure, MockPage,
    MockSource, SeoulOpenApiSource, SourceConfig,
};
use subway_types::{DayKey, NaiveDate};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn key(d: u32) -> DayKey {
    DayKey::from(date(d))
}

fn config(workers: usize) -> IngestConfig {
    IngestConfig::default()
        .with_workers(workers)
        .with_collector(CollectorConfig::default().with_page_size(1000))
}

#[tokio::test]
async fn test_three_day_run_with_one_failed_day() {
    let mock = MockSource::new()
        .with_pages(key(1), [1000, 1000, 0])
        .with_pages(key(2), [500, 0])
        .with_script(key(3), vec![MockPage::Fail(MockFailure::Transport)]);
    let shared = Arc::new(mock);
    let coordinator = Coordinator::with_shared_source(Arc::clone(&shared), config(2)).unwrap();

    let outcome = coordinator.run_range(date(1), date(3)).await.unwrap();

    assert_eq!(outcome.dataset.len(), 2500);
    let days: Vec<&str> = outcome
        .dataset
        .iter()
        .map(|r| r["USE_YMD"].as_str().unwrap())
        .collect();
    assert!(days[..2000].iter().all(|d| *d == "20240101"));
    assert!(days[2000..].iter().all(|d| *d == "20240102"));

    assert_eq!(outcome.report.attempted, 3);
    assert_eq!(outcome.report.failed_days(), [key(3)]);
    assert!(matches!(
        outcome.report.failures[0].1.error,
        IngestionError::Transport(_)
    ));

    // Day 1: two full pages and the empty one; day 2: one page and the empty one
    assert_eq!(shared.calls_for(key(1)).len(), 3);
    assert_eq!(shared.calls_for(key(2)).len(), 2);
    assert_eq!(shared.calls_for(key(3)).len(), 1);
}

#[tokio::test]
async fn test_within_day_order_is_page_then_row() {
    let mock = MockSource::new().with_pages(key(1), [1000, 1000]);
    let coordinator = Coordinator::new(mock, config(2)).unwrap();

    let outcome = coordinator.run_range(date(1), date(1)).await.unwrap();

    let stations: Vec<&str> = outcome
        .dataset
        .iter()
        .map(|r| r["SBWY_STNS_NM"].as_str().unwrap())
        .collect();
    assert_eq!(stations[0], "역1");
    assert_eq!(stations[999], "역1000");
    assert_eq!(stations[1000], "역1001");
    assert_eq!(stations[1999], "역2000");
}

#[tokio::test]
async fn test_all_days_failing_is_total_failure() {
    let mock = MockSource::new()
        .with_script(key(1), vec![MockPage::Fail(MockFailure::Status(502))])
        .with_script(key(2), vec![MockPage::Fail(MockFailure::Transport)]);
    let coordinator = Coordinator::new(mock, config(2)).unwrap();

    let err = coordinator.run_range(date(1), date(2)).await.unwrap_err();
    assert!(matches!(err, IngestionError::TotalFailure { days: 2 }));
}

#[tokio::test]
async fn test_http_source_through_coordinator() {
    let server = MockServer::start().await;

    let row = |day: &str, station: &str| {
        json!({
            "USE_YMD": day,
            "SBWY_ROUT_LN_NM": "2호선",
            "SBWY_STNS_NM": station,
            "GTON_TNOPE": 1,
            "GTOFF_TNOPE": 2,
            "REG_YMD": day
        })
    };

    Mock::given(method("GET"))
        .and(path_regex(r"/CardSubwayStatsNew/1/2/20240101/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CardSubwayStatsNew": {"row": [row("20240101", "강남"), row("20240101", "역삼")]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/CardSubwayStatsNew/3/4/20240101/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CardSubwayStatsNew": {"row": [row("20240101", "선릉")]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/CardSubwayStatsNew/5/6/20240101/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CardSubwayStatsNew": {"list_total_count": 0}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/CardSubwayStatsNew/1/2/20240102/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let source = SeoulOpenApiSource::new(
        SourceConfig::new("test-key")
            .with_base_url(&server.uri())
            .unwrap(),
    )
    .unwrap();
    let config = IngestConfig::default()
        .with_workers(2)
        .with_collector(CollectorConfig::default().with_page_size(2));
    let coordinator = Coordinator::new(source, config).unwrap();

    let outcome = coordinator.run_range(date(1), date(2)).await.unwrap();

    let stations: Vec<&str> = outcome
        .dataset
        .iter()
        .map(|r| r["SBWY_STNS_NM"].as_str().unwrap())
        .collect();
    assert_eq!(stations, ["강남", "역삼", "선릉"]);
    assert_eq!(outcome.report.failed_days(), [key(2)]);
}
