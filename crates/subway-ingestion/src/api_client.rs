//! HTTP client for the Seoul Open Data ridership API.
//!
//! # Request Shape
//!
//! Every parameter is a path segment:
//!
//! ```text
//! {base}/{key}/{format}/CardSubwayStatsNew/{start}/{end}/{YYYYMMDD}/{route}/{station}
//! ```
//!
//! Route and station are optional filters. They are always sent (possibly
//! empty) because the API resolves segments by position.
//!
//! # Response Shape
//!
//! ```text
//! {"CardSubwayStatsNew": {"list_total_count": 612, "RESULT": {...}, "row": [{...}, ...]}}
//! ```
//!
//! A missing or empty `row` means the window is past the end of the day's
//! data. Any other top-level shape (the API also answers
//! `{"RESULT": {"CODE": "INFO-200", ...}}`) is a schema violation.

use crate::config::{SourceConfig, RESOURCE_NAME};
use crate::error::IngestionError;
use crate::PageSource;
use reqwest::StatusCode;
use serde_json::Value;
use subway_types::{PageRequest, Record};
use url::Url;

/// How much of an unexpected body is quoted in a schema error.
const BODY_EXCERPT_LEN: usize = 200;

/// Production page source backed by `reqwest`.
///
/// Holds no per-call mutable state; the inner client pools connections
/// and is safe to share across every day task of a run.
pub struct SeoulOpenApiSource {
    http_client: reqwest::Client,
    config: SourceConfig,
}

impl SeoulOpenApiSource {
    /// Create a source from a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Config`] if the config is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: SourceConfig) -> Result<Self, IngestionError> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IngestionError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Build the request URL for a window.
    fn build_url(&self, request: &PageRequest) -> Result<Url, IngestionError> {
        self.url_with_key(request, &self.config.api_key)
    }

    /// The request URL with `***` in the key segment, for logs and error
    /// messages.
    fn redacted_url(&self, request: &PageRequest) -> Result<String, IngestionError> {
        Ok(self.url_with_key(request, "***")?.into())
    }

    fn url_with_key(&self, request: &PageRequest, key: &str) -> Result<Url, IngestionError> {
        let start = request.start_index().to_string();
        let end = request.end_index().to_string();
        let day = request.day().to_string();

        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IngestionError::Config("base url cannot carry a path".into()))?
            .pop_if_empty()
            .extend([
                key,
                self.config.format.as_str(),
                RESOURCE_NAME,
                start.as_str(),
                end.as_str(),
                day.as_str(),
                self.config.route.as_str(),
                self.config.station.as_str(),
            ]);
        Ok(url)
    }
}

impl PageSource for SeoulOpenApiSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Vec<Record>, IngestionError> {
        let url = self.build_url(request)?;
        let shown = self.redacted_url(request)?;
        tracing::debug!("GET {}", shown);

        let response = self.http_client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            return Err(IngestionError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: shown,
            });
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| {
            IngestionError::Schema(format!("body is not JSON ({}): {}", e, excerpt(&body)))
        })?;

        decode_page(json)
    }
}

/// Extract the rows from a decoded response body.
pub(crate) fn decode_page(body: Value) -> Result<Vec<Record>, IngestionError> {
    let Value::Object(mut top) = body else {
        return Err(IngestionError::Schema(format!(
            "expected a JSON object, got {}",
            excerpt(&body.to_string())
        )));
    };

    let Some(resource) = top.remove(RESOURCE_NAME) else {
        return Err(IngestionError::Schema(format!(
            "missing `{}` key: {}",
            RESOURCE_NAME,
            excerpt(&Value::Object(top).to_string())
        )));
    };

    match resource.get("row") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => rows
            .iter()
            .map(|row| match row {
                Value::Object(fields) => Ok(fields.clone()),
                other => Err(IngestionError::Schema(format!(
                    "row is not an object: {}",
                    excerpt(&other.to_string())
                ))),
            })
            .collect(),
        Some(other) => Err(IngestionError::Schema(format!(
            "`row` is not a list: {}",
            excerpt(&other.to_string())
        ))),
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use subway_types::DayKey;

    fn source() -> SeoulOpenApiSource {
        SeoulOpenApiSource::new(SourceConfig::new("sample-key")).unwrap()
    }

    fn request() -> PageRequest {
        PageRequest::window(DayKey::from_ymd(2024, 1, 1).unwrap(), 1, 1000).unwrap()
    }

    #[test]
    fn test_build_url_without_filters() {
        let url = source().build_url(&request()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://openapi.seoul.go.kr:8088/sample-key/json/CardSubwayStatsNew/1001/2000/20240101//"
        );
    }

    #[test]
    fn test_build_url_escapes_filters() {
        let config = SourceConfig::new("sample-key")
            .with_route("2호선")
            .with_station("서울역/1");
        let source = SeoulOpenApiSource::new(config).unwrap();
        let url = source.build_url(&request()).unwrap();

        assert!(url.as_str().ends_with("/20240101/2%ED%98%B8%EC%84%A0/%EC%84%9C%EC%9A%B8%EC%97%AD%2F1"));
    }

    #[test]
    fn test_redacted_url_hides_key() {
        let source = source();
        let shown = source.redacted_url(&request()).unwrap();
        assert!(!shown.contains("sample-key"));
        assert_eq!(
            shown,
            "http://openapi.seoul.go.kr:8088/***/json/CardSubwayStatsNew/1001/2000/20240101//"
        );
    }

    #[test]
    fn test_redacted_url_leaves_host_alone() {
        let source = SeoulOpenApiSource::new(SourceConfig::new("seoul")).unwrap();
        let shown = source.redacted_url(&request()).unwrap();
        assert!(shown.starts_with("http://openapi.seoul.go.kr:8088/***/json/"));
        assert!(!shown.contains("/seoul/"));
    }

    #[test]
    fn test_redacted_url_hides_escaped_key() {
        let source = SeoulOpenApiSource::new(SourceConfig::new("ab cd")).unwrap();
        assert!(source.build_url(&request()).unwrap().as_str().contains("/ab%20cd/"));

        let shown = source.redacted_url(&request()).unwrap();
        assert!(!shown.contains("ab%20cd"));
        assert!(!shown.contains("ab cd"));
        assert!(shown.contains("/***/json/"));
    }

    #[test]
    fn test_decode_rows_in_order() {
        let body = json!({
            "CardSubwayStatsNew": {
                "list_total_count": 2,
                "RESULT": {"CODE": "INFO-000", "MESSAGE": "정상 처리되었습니다"},
                "row": [
                    {"USE_YMD": "20240101", "SBWY_STNS_NM": "서울역", "GTON_TNOPE": 100},
                    {"USE_YMD": "20240101", "SBWY_STNS_NM": "시청", "GTON_TNOPE": 50}
                ]
            }
        });

        let rows = decode_page(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["SBWY_STNS_NM"], "시청");
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["USE_YMD", "SBWY_STNS_NM", "GTON_TNOPE"]);
    }

    #[test]
    fn test_decode_missing_row_is_empty() {
        let body = json!({"CardSubwayStatsNew": {"list_total_count": 0}});
        assert!(decode_page(body).unwrap().is_empty());

        let body = json!({"CardSubwayStatsNew": {"row": []}});
        assert!(decode_page(body).unwrap().is_empty());
    }

    #[test]
    fn test_decode_missing_top_level_key() {
        let body = json!({"RESULT": {"CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다."}});
        let err = decode_page(body).unwrap_err();
        assert!(matches!(err, IngestionError::Schema(ref msg) if msg.contains("INFO-200")));
    }

    #[test]
    fn test_decode_rejects_non_list_row() {
        let body = json!({"CardSubwayStatsNew": {"row": "nope"}});
        assert!(matches!(decode_page(body), Err(IngestionError::Schema(_))));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(matches!(decode_page(json!([1, 2])), Err(IngestionError::Schema(_))));
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "역".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), BODY_EXCERPT_LEN + 3);
    }
}
