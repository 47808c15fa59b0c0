//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_BASE_URL` - Base URL of the commerce backend (e.g., `https://api.example.com/api/`)
//!
//! ## Optional
//! - `STOREFRONT_API_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `STOREFRONT_SHIPPING_FLAT_RATE` - Flat shipping cost in base currency (default: 5)
//! - `USD_TO_NPR_RATE` - Display conversion rate (default: 133.5)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Tracing sample rate (default: 0.0)

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default USD to NPR conversion rate, overridable via `USD_TO_NPR_RATE`.
const DEFAULT_USD_TO_NPR: &str = "133.5";

/// Default flat shipping rate in base currency (USD).
const DEFAULT_SHIPPING_FLAT_RATE: &str = "5";

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
    /// Backend API configuration.
    pub api: ApiConfig,
    /// Currency display configuration.
    pub currency: CurrencyConfig,
    /// Flat shipping cost shown at the shipping step (base currency).
    pub shipping_flat_rate: Decimal,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g., "production").
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate.
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate.
    pub sentry_traces_sample_rate: f32,
}

/// Commerce backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL all endpoint paths are joined onto. Must end with a slash.
    pub base_url: Url,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Currency display configuration.
#[derive(Debug, Clone)]
pub struct CurrencyConfig {
    /// Conversion rate applied when rendering USD amounts as NPR.
    pub usd_to_npr: Decimal,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            api: ApiConfig::from_env()?,
            currency: CurrencyConfig::from_env()?,
            shipping_flat_rate: parse_env(
                "STOREFRONT_SHIPPING_FLAT_RATE",
                DEFAULT_SHIPPING_FLAT_RATE,
            )?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("STOREFRONT_API_BASE_URL")?;
        // A trailing slash makes Url::join treat the last segment as a directory.
        let normalized = if raw.ends_with('/') { raw } else { format!("{raw}/") };
        let base_url = Url::parse(&normalized).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_API_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            timeout_secs: parse_env(
                "STOREFRONT_API_TIMEOUT_SECS",
                &DEFAULT_TIMEOUT_SECS.to_string(),
            )?,
        })
    }

    /// Build a configuration for a known base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            base_url: Url::parse(&normalized).map_err(|e| {
                ConfigError::InvalidEnvVar("base_url".to_string(), e.to_string())
            })?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }
}

impl CurrencyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            usd_to_npr: parse_env("USD_TO_NPR_RATE", DEFAULT_USD_TO_NPR)?,
        })
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            // DEFAULT_USD_TO_NPR is a valid decimal literal
            usd_to_npr: Decimal::new(1335, 1),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable into `T`, falling back to `default` when unset.
fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_normalizes_trailing_slash() {
        let config = ApiConfig::for_base_url("https://api.example.com/api").unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.example.com/api/");

        let joined = config.base_url.join("cart/").unwrap();
        assert_eq!(joined.as_str(), "https://api.example.com/api/cart/");
    }

    #[test]
    fn test_api_config_rejects_garbage_url() {
        assert!(ApiConfig::for_base_url("not a url").is_err());
    }

    #[test]
    fn test_currency_config_default_rate() {
        let config = CurrencyConfig::default();
        assert_eq!(config.usd_to_npr.to_string(), "133.5");
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let rate: f32 = parse_env("DRIFTMARKET_TEST_UNSET_VAR", "0.25").unwrap();
        assert!((rate - 0.25).abs() < f32::EPSILON);
    }
}
