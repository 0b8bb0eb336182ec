//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Storage
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string.
//!   When neither is set the storefront runs on local JSON files.
//! - `BLOOM_DATA_DIR` - Local data directory (default: `data`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `BLOOM_SHOP_LAT` / `BLOOM_SHOP_LON` - Shop location for delivery distances
//! - `BLOOM_SHIPPING_BASE_FEE` - Flat delivery fee (default: 5.00)
//! - `BLOOM_SHIPPING_PER_KM` - Fee per kilometre (default: 0.50)
//! - `BLOOM_FREE_SHIPPING_THRESHOLD` - Subtotal for free delivery (default: 100.00, `none` disables)
//! - `BLOOM_MAX_DELIVERY_KM` - Delivery radius (default: 50)
//! - `BLOOM_CURRENCY` - Display currency (default: USD)
//! - `GEOCODER_URL` - Nominatim-compatible endpoint (default: public OSM instance)
//! - `GEOCODER_USER_AGENT` - User agent sent to the geocoder
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//! - `BLOOM_LOG_JSON` - Emit JSON logs when set

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use bloom_core::shipping::{Coordinates, ShippingRates};
use bloom_core::types::{CurrencyCode, Money};
use bloom_store::StoreConfig;
use rust_decimal::Decimal;
use thiserror::Error;

/// Default shop location (Ho Chi Minh City, District 1).
pub const DEFAULT_SHOP_LOCATION: Coordinates = Coordinates {
    lat: 10.7769,
    lon: 106.7009,
};

/// Public Nominatim instance.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Document store backend
    pub store: StoreConfig,
    /// Delivery pricing and shop location
    pub shop: ShopConfig,
    /// Address geocoding
    pub geocoder: GeocoderConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs
    pub log_json: bool,
}

/// Shop location and delivery pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopConfig {
    pub location: Coordinates,
    pub rates: ShippingRates,
    pub currency: CurrencyCode,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            location: DEFAULT_SHOP_LOCATION,
            rates: ShippingRates::default(),
            currency: CurrencyCode::default(),
        }
    }
}

/// Geocoder client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: format!("bloom-storefront/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl StorefrontConfig {
    /// Configuration with every default applied over the given store.
    #[must_use]
    pub fn new(store: StoreConfig) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            store,
            shop: ShopConfig::default(),
            geocoder: GeocoderConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
            log_json: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");

        Ok(Self {
            host,
            port,
            base_url,
            store: StoreConfig::from_env("STOREFRONT"),
            shop: ShopConfig::from_env()?,
            geocoder: GeocoderConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
            log_json: get_optional_env("BLOOM_LOG_JSON").is_some(),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked secure.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ShopConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = ShippingRates::default();
        let location = Coordinates::new(
            parse_env("BLOOM_SHOP_LAT", &DEFAULT_SHOP_LOCATION.lat.to_string())?,
            parse_env("BLOOM_SHOP_LON", &DEFAULT_SHOP_LOCATION.lon.to_string())?,
        )
        .map_err(|e| ConfigError::InvalidEnvVar("BLOOM_SHOP_LAT/BLOOM_SHOP_LON".into(), e.to_string()))?;

        let free_shipping_threshold = match get_optional_env("BLOOM_FREE_SHIPPING_THRESHOLD") {
            Some(v) if v.trim().eq_ignore_ascii_case("none") || v.trim().is_empty() => None,
            Some(v) => Some(parse_money("BLOOM_FREE_SHIPPING_THRESHOLD", &v)?),
            None => defaults.free_shipping_threshold,
        };

        Ok(Self {
            location,
            rates: ShippingRates {
                base_fee: money_env("BLOOM_SHIPPING_BASE_FEE", defaults.base_fee)?,
                per_km_fee: money_env("BLOOM_SHIPPING_PER_KM", defaults.per_km_fee)?,
                free_shipping_threshold,
                max_distance_km: parse_env(
                    "BLOOM_MAX_DELIVERY_KM",
                    &defaults.max_distance_km.to_string(),
                )?,
            },
            currency: parse_env("BLOOM_CURRENCY", "USD")?,
        })
    }
}

impl GeocoderConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: get_optional_env("GEOCODER_URL").unwrap_or(defaults.base_url),
            user_agent: get_optional_env("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_money(key: &str, value: &str) -> Result<Money, ConfigError> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if amount.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(Money::new(amount))
}

fn money_env(key: &str, default: Money) -> Result<Money, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |v| parse_money(key, &v))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig::new(StoreConfig::local("data"))
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = "https://bloomflowers.shop".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(
            parse_money("X", " 7.5 ").unwrap(),
            Money::from_cents(750)
        );
        assert!(parse_money("X", "-1").is_err());
        assert!(parse_money("X", "abc").is_err());
    }

    #[test]
    fn test_geocoder_user_agent_names_the_service() {
        assert!(GeocoderConfig::default().user_agent.starts_with("bloom-storefront/"));
    }
}
