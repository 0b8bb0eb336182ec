//! Address geocoding against a Nominatim-compatible API.
//!
//! Results are cached with `moka` for 24 hours.

use std::sync::Arc;
use std::time::Duration;

use bloom_core::shipping::Coordinates;
use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::GeocoderConfig;

/// Request timeout for geocoder calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when geocoding an address.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status}")]
    Api { status: u16 },

    /// No result for the address.
    #[error("Address not found: {0}")]
    NotFound(String),

    /// Configured endpoint is not a valid URL.
    #[error("Invalid geocoder URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One Nominatim search hit. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

/// Geocoding client with an in-memory cache.
#[derive(Clone)]
pub struct Geocoder {
    inner: Arc<GeocoderInner>,
}

struct GeocoderInner {
    client: reqwest::Client,
    search_url: Url,
    cache: Cache<String, Coordinates>,
}

impl Geocoder {
    /// Create a new geocoder.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid or the HTTP client fails to build.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| GeocodeError::Parse(format!("Invalid user agent: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let search_url = Url::parse(&base)?.join("search")?;

        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(24 * 60 * 60))
            .build();

        Ok(Self {
            inner: Arc::new(GeocoderInner {
                client,
                search_url,
                cache,
            }),
        })
    }

    /// Resolve a free-form address to coordinates.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::NotFound` when the address has no match, or a
    /// transport error.
    #[instrument(skip(self))]
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let cache_key = cache_key(address);
        if cache_key.is_empty() {
            return Err(GeocodeError::NotFound(address.to_string()));
        }

        if let Some(coords) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for address");
            return Ok(coords);
        }

        let url = self.search_url_for(address);
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Api {
                status: status.as_u16(),
            });
        }

        let places: Vec<Place> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))?;
        let coords = parse_place(&place)?;

        self.inner.cache.insert(cache_key, coords).await;
        Ok(coords)
    }

    fn search_url_for(&self, address: &str) -> Url {
        let mut url = self.inner.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "jsonv2")
            .append_pair("limit", "1");
        url
    }
}

/// Normalized cache key: lowercase, single spaces.
fn cache_key(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_place(place: &Place) -> Result<Coordinates, GeocodeError> {
    let lat = place
        .lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("lat: {e}")))?;
    let lon = place
        .lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("lon: {e}")))?;
    Coordinates::new(lat, lon).map_err(|e| GeocodeError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalizes() {
        assert_eq!(
            cache_key("  12 Le Loi,\n  District 1 "),
            "12 le loi, district 1"
        );
        assert_eq!(cache_key("   "), "");
    }

    #[test]
    fn test_search_url() {
        let geocoder = Geocoder::new(&GeocoderConfig {
            base_url: "https://geo.example.com/".to_string(),
            user_agent: "bloom-test".to_string(),
        })
        .unwrap();
        let url = geocoder.search_url_for("12 Le Loi & Co");
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("q".into(), "12 Le Loi & Co".into())));
        assert!(pairs.contains(&("format".into(), "jsonv2".into())));
    }

    #[test]
    fn test_parse_place() {
        let place: Place =
            serde_json::from_str(r#"{"lat":"10.7769","lon":"106.7009","display_name":"x"}"#)
                .unwrap();
        let coords = parse_place(&place).unwrap();
        assert!((coords.lat - 10.7769).abs() < 1e-9);

        let bad = Place {
            lat: "95".into(),
            lon: "0".into(),
        };
        assert!(parse_place(&bad).is_err());
    }

    #[tokio::test]
    async fn test_blank_address_is_not_found() {
        let geocoder = Geocoder::new(&GeocoderConfig::default()).unwrap();
        assert!(matches!(
            geocoder.geocode("  ").await,
            Err(GeocodeError::NotFound(_))
        ));
    }
}
