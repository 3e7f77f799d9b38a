//! Station geocoding through the Kakao local search API.
//!
//! Used after ingestion to place stations on a map. The lookup is a
//! keyword search for `"{station}역"`; the first hit wins.
//!
//! The API is rate limited, so [`locate_stations`] spaces calls out by a
//! fixed delay and never stops on a single bad lookup.

use crate::error::IngestionError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Kakao keyword search endpoint.
const KAKAO_SEARCH_URL: &str = "https://dapi.kakao.com/v2/local/search/keyword.json";

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Output row of a geocoding pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCoordinates {
    pub station: String,
    pub lat: f64,
    pub lng: f64,
}

impl StationCoordinates {
    /// CSV header for a file of these rows, in field order.
    pub const COLUMNS: [&'static str; 3] = ["station", "lat", "lng"];
}

/// Looks up a station's position by name.
pub trait Geocoder: Send + Sync {
    /// First match for `station`, or `None` if the service has no match.
    fn locate(
        &self,
        station: &str,
    ) -> impl std::future::Future<Output = Result<Option<Coordinates>, IngestionError>> + Send;
}

#[derive(Debug, Deserialize)]
struct KeywordResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

/// Kakao returns coordinates as decimal strings; `x` is longitude.
#[derive(Debug, Deserialize)]
struct Document {
    x: String,
    y: String,
}

/// Geocoder backed by the Kakao local API.
pub struct KakaoGeocoder {
    http_client: reqwest::Client,
    api_key: String,
    search_url: Url,
}

impl KakaoGeocoder {
    /// Create a geocoder with a Kakao REST API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, IngestionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(IngestionError::Config("Kakao API key is empty".into()));
        }
        Ok(Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .map_err(|e| IngestionError::Config(format!("http client: {}", e)))?,
            api_key,
            search_url: Url::parse(KAKAO_SEARCH_URL)
                .map_err(|e| IngestionError::Config(e.to_string()))?,
        })
    }

    /// Send searches to another endpoint (tests, proxies).
    pub fn with_search_url(mut self, url: &str) -> Result<Self, IngestionError> {
        self.search_url = Url::parse(url)
            .map_err(|e| IngestionError::Config(format!("invalid search url {}: {}", url, e)))?;
        Ok(self)
    }
}

impl Geocoder for KakaoGeocoder {
    async fn locate(&self, station: &str) -> Result<Option<Coordinates>, IngestionError> {
        let response = self
            .http_client
            .get(self.search_url.clone())
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(&[("query", format!("{}역", station))])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            tracing::debug!("Kakao search for {} returned {}", station, response.status());
            return Ok(None);
        }

        let body: KeywordResponse = response
            .json()
            .await
            .map_err(|e| IngestionError::Schema(format!("kakao response: {}", e)))?;

        let Some(top) = body.documents.first() else {
            return Ok(None);
        };
        let parse = |value: &str| {
            value
                .parse::<f64>()
                .map_err(|_| IngestionError::Schema(format!("bad coordinate: {}", value)))
        };
        Ok(Some(Coordinates {
            latitude: parse(&top.y)?,
            longitude: parse(&top.x)?,
        }))
    }
}

/// Geocode every distinct station name, pausing `delay` between calls.
///
/// Names are deduplicated (first occurrence wins the position) and blank
/// names are skipped. Stations that cannot be located are logged and left
/// out of the result.
pub async fn locate_stations<G, I, N>(geocoder: &G, names: I, delay: Duration) -> Vec<StationCoordinates>
where
    G: Geocoder + ?Sized,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut seen = HashSet::new();
    let stations: Vec<String> = names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty() && seen.insert(n.clone()))
        .collect();

    let mut located = Vec::with_capacity(stations.len());
    for (i, station) in stations.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match geocoder.locate(station).await {
            Ok(Some(point)) => {
                tracing::info!(
                    "Located {} at {}, {}",
                    station,
                    point.latitude,
                    point.longitude
                );
                located.push(StationCoordinates {
                    station: station.clone(),
                    lat: point.latitude,
                    lng: point.longitude,
                });
            }
            Ok(None) => tracing::warn!("No coordinates for {}", station),
            Err(e) => tracing::warn!("Lookup failed for {}: {}", station, e),
        }
    }

    tracing::info!("Located {} of {} stations", located.len(), stations.len());
    located
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeGeocoder {
        known: HashMap<&'static str, Coordinates>,
        asked: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn new() -> Self {
            let mut known = HashMap::new();
            known.insert(
                "서울역",
                Coordinates {
                    latitude: 37.5547,
                    longitude: 126.9707,
                },
            );
            known.insert(
                "시청",
                Coordinates {
                    latitude: 37.5657,
                    longitude: 126.9769,
                },
            );
            Self {
                known,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl Geocoder for FakeGeocoder {
        async fn locate(&self, station: &str) -> Result<Option<Coordinates>, IngestionError> {
            self.asked.lock().unwrap().push(station.to_string());
            if station == "broken" {
                return Err(IngestionError::Transport("reset".into()));
            }
            Ok(self.known.get(station).copied())
        }
    }

    #[tokio::test]
    async fn test_locate_skips_misses_and_errors() {
        let geocoder = FakeGeocoder::new();
        let found = locate_stations(
            &geocoder,
            ["서울역", "없는역", "broken", "시청"],
            Duration::ZERO,
        )
        .await;

        let names: Vec<&str> = found.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, ["서울역", "시청"]);
        assert_eq!(found[0].lat, 37.5547);
        assert_eq!(geocoder.asked.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_locate_deduplicates_names() {
        let geocoder = FakeGeocoder::new();
        let found = locate_stations(
            &geocoder,
            vec!["시청", " 시청 ", "", "서울역", "시청"],
            Duration::ZERO,
        )
        .await;

        assert_eq!(found.len(), 2);
        assert_eq!(*geocoder.asked.lock().unwrap(), ["시청", "서울역"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_waits_between_calls() {
        let geocoder = FakeGeocoder::new();
        let started = tokio::time::Instant::now();

        locate_stations(&geocoder, ["서울역", "시청", "을지로입구"], Duration::from_millis(200)).await;

        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(KakaoGeocoder::new("").is_err());
    }
}
