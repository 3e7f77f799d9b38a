//! HTTP-level tests for the Seoul Open API source against a local mock server.
//!
//! The live test at the bottom needs a real key.
//! Run with: cargo test -p subway-ingestion --test fetch_data -- --ignored --nocapture

use serde_json::json;
use subway_ingestion::{IngestionError, PageSource, SeoulOpenApiSource, SourceConfig};
use subway_types::{DayKey, PageRequest};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn day() -> DayKey {
    DayKey::from_ymd(2024, 1, 1).unwrap()
}

fn source_for(server: &MockServer) -> SeoulOpenApiSource {
    let config = SourceConfig::new("test-key")
        .with_base_url(&server.uri())
        .unwrap();
    SeoulOpenApiSource::new(config).unwrap()
}

fn rows_body(count: usize) -> serde_json::Value {
    let rows: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "USE_YMD": "20240101",
                "SBWY_ROUT_LN_NM": "1호선",
                "SBWY_STNS_NM": format!("역{}", i),
                "GTON_TNOPE": 100 + i,
                "GTOFF_TNOPE": 90 + i,
                "REG_YMD": "20240104"
            })
        })
        .collect();
    json!({
        "CardSubwayStatsNew": {
            "list_total_count": count,
            "RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다"},
            "row": rows
        }
    })
}

#[tokio::test]
async fn test_fetch_page_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/test-key/json/CardSubwayStatsNew/1/1000/20240101/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows_body(3)))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let request = PageRequest::window(day(), 0, 1000).unwrap();
    let rows = source.fetch_page(&request).await.unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["SBWY_STNS_NM"], "역2");
    let columns: Vec<&String> = rows[0].keys().collect();
    assert_eq!(
        columns,
        ["USE_YMD", "SBWY_ROUT_LN_NM", "SBWY_STNS_NM", "GTON_TNOPE", "GTOFF_TNOPE", "REG_YMD"]
    );
}

#[tokio::test]
async fn test_fetch_page_requests_the_right_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/test-key/json/CardSubwayStatsNew/2001/3000/20240101/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CardSubwayStatsNew": {"list_total_count": 0}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let request = PageRequest::window(day(), 2, 1000).unwrap();
    let rows = source.fetch_page(&request).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_non_200_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let request = PageRequest::window(day(), 0, 1000).unwrap();
    let err = source.fetch_page(&request).await.unwrap_err();

    match err {
        IngestionError::UnexpectedStatus { status, url } => {
            assert_eq!(status, 500);
            assert!(!url.contains("test-key"));
        }
        other => panic!("expected UnexpectedStatus, got {:?}", other),
    }
    assert!(IngestionError::UnexpectedStatus {
        status: 500,
        url: String::new()
    }
    .is_retryable());
}

#[tokio::test]
async fn test_missing_resource_key_is_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RESULT": {"CODE": "ERROR-331", "MESSAGE": "요청시작위치 값을 확인하십시오."}
        })))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let request = PageRequest::window(day(), 0, 1000).unwrap();
    let err = source.fetch_page(&request).await.unwrap_err();

    assert!(matches!(err, IngestionError::Schema(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_non_json_body_is_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let source = source_for(&server);
    let request = PageRequest::window(day(), 0, 1000).unwrap();
    let err = source.fetch_page(&request).await.unwrap_err();
    assert!(matches!(err, IngestionError::Schema(ref msg) if msg.contains("maintenance")));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Nothing listens on port 9 of localhost in the test environment
    let config = SourceConfig::new("test-key")
        .with_base_url("http://127.0.0.1:9")
        .unwrap();
    let source = SeoulOpenApiSource::new(config).unwrap();
    let request = PageRequest::window(day(), 0, 1000).unwrap();

    let err = source.fetch_page(&request).await.unwrap_err();
    assert!(matches!(err, IngestionError::Transport(_)));
}

#[tokio::test]
#[ignore] // Requires SEOUL_OPEN_API_KEY and network access
async fn test_fetch_live_first_page() {
    let source = SeoulOpenApiSource::new(SourceConfig::from_env().unwrap()).unwrap();
    let request = PageRequest::window(day(), 0, 5).unwrap();

    match source.fetch_page(&request).await {
        Ok(rows) => {
            println!("   Success! Got {} rows.", rows.len());
            for row in &rows {
                println!("     - {:?}", row);
            }
        }
        Err(e) => panic!("Failed to fetch live page: {}", e),
    }
}
