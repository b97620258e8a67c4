//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_URL` - Base URL of the stock/product API (e.g., `http://localhost:3333`)
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token sent to the stock API
//! - `CART_API_TIMEOUT_SECS` - Request timeout in seconds (default: 10)
//! - `CART_STORAGE_DIR` - Directory for the file-backed snapshot store (default: `.cart`)
//! - `CART_STORAGE_KEY` - Key holding the cart snapshot (default: `storefront:cart`)
//! - `CART_HEADROOM_POLICY` - `reserve` or `strict` (default: `reserve`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default key under which the cart snapshot is stored.
pub const DEFAULT_STORAGE_KEY: &str = "storefront:cart";

const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_STORAGE_DIR: &str = ".cart";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How much stock must remain available before a quantity change is accepted.
///
/// Adding a product always accepts a candidate amount up to the available
/// stock. The policies differ only for explicit quantity updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadroomPolicy {
    /// Updates keep one unit in reserve: `amount + 1 <= stock`.
    #[default]
    Reserve,
    /// Updates accept anything up to the available stock: `amount <= stock`.
    Strict,
}

impl HeadroomPolicy {
    /// Whether adding up to `candidate` units is allowed with `available` in stock.
    #[must_use]
    pub const fn allows_add(self, candidate: u32, available: u32) -> bool {
        candidate <= available
    }

    /// Whether setting the amount to `requested` is allowed with `available` in stock.
    #[must_use]
    pub const fn allows_update(self, requested: u32, available: u32) -> bool {
        match self {
            // Same as `requested + 1 <= available` without the overflow.
            Self::Reserve => requested < available,
            Self::Strict => requested <= available,
        }
    }
}

impl FromStr for HeadroomPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reserve" => Ok(Self::Reserve),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown headroom policy '{other}' (expected reserve or strict)")),
        }
    }
}

/// Cart application configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Stock/product API configuration
    pub api: StockApiConfig,
    /// Snapshot storage configuration
    pub storage: StorageConfig,
    /// Headroom policy applied to quantity checks
    pub headroom: HeadroomPolicy,
}

/// Stock/product API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct StockApiConfig {
    /// Base URL; `stock/{id}` and `products/{id}` are resolved against it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for StockApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Snapshot storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one file per key
    pub dir: PathBuf,
    /// Key holding the cart snapshot
    pub key: String,
}

impl CartConfig {
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

        let api = StockApiConfig::from_env()?;
        let storage = StorageConfig {
            dir: PathBuf::from(get_env_or_default("CART_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            key: get_env_or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY),
        };
        let headroom = get_env_or_default("CART_HEADROOM_POLICY", "reserve")
            .parse::<HeadroomPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_HEADROOM_POLICY".to_string(), e))?;

        Ok(Self {
            api,
            storage,
            headroom,
        })
    }
}

impl StockApiConfig {
    /// Build an API configuration for `base_url` with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("CART_API_URL", base_url)?,
            token: None,
            timeout: Duration::from_secs(10),
        })
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url("CART_API_URL", &get_required_env("CART_API_URL")?)?;
        let timeout_secs = get_env_or_default("CART_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CART_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            token: get_optional_env("CART_API_TOKEN").map(SecretString::from),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a base URL, forcing a trailing slash so relative joins keep the path.
fn parse_base_url(var_name: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headroom_add_allows_up_to_stock() {
        for policy in [HeadroomPolicy::Reserve, HeadroomPolicy::Strict] {
            assert!(policy.allows_add(5, 5));
            assert!(!policy.allows_add(6, 5));
            assert!(!policy.allows_add(1, 0));
        }
    }

    #[test]
    fn test_headroom_reserve_keeps_one_unit_on_update() {
        let policy = HeadroomPolicy::Reserve;
        assert!(policy.allows_update(4, 5));
        assert!(!policy.allows_update(5, 5));
        assert!(!policy.allows_update(u32::MAX, u32::MAX));
    }

    #[test]
    fn test_headroom_strict_update() {
        let policy = HeadroomPolicy::Strict;
        assert!(policy.allows_update(5, 5));
        assert!(!policy.allows_update(6, 5));
    }

    #[test]
    fn test_headroom_policy_from_str() {
        assert_eq!("reserve".parse::<HeadroomPolicy>(), Ok(HeadroomPolicy::Reserve));
        assert_eq!(" STRICT ".parse::<HeadroomPolicy>(), Ok(HeadroomPolicy::Strict));
        assert!("lenient".parse::<HeadroomPolicy>().is_err());
    }

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("TEST_URL", "http://localhost:3333/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3333/api/");
        assert_eq!(url.join("stock/1").unwrap().as_str(), "http://localhost:3333/api/stock/1");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let err = parse_base_url("TEST_URL", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "TEST_URL"));

        assert!(parse_base_url("TEST_URL", "mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let mut config = StockApiConfig::new("http://localhost:3333").unwrap();
        config.token = Some(SecretString::from("super_secret_token"));

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("localhost:3333"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
