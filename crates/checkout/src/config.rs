//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! ## Optional
//! - `CHECKOUT_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `CHECKOUT_ORDER_PREFIX` - Order number prefix (default: DW)
//! - `CHECKOUT_DEFAULT_SHIPPING` - Shipping applied when the request carries
//!   none (default: 0)

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_ORDER_PREFIX: &str = "DW";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout pipeline configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Maximum connections in the pool
    pub max_connections: u32,
    /// Prefix for generated order numbers (e.g., "DW" -> DW-20260806-4821)
    pub order_prefix: String,
    /// Shipping amount used when a checkout request supplies none
    pub default_shipping: Decimal,
}

impl CheckoutConfig {
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

        let database_url = get_database_url("CHECKOUT_DATABASE_URL")?;
        let max_connections = get_env_or_default(
            "CHECKOUT_MAX_CONNECTIONS",
            &DEFAULT_MAX_CONNECTIONS.to_string(),
        )
        .parse::<u32>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CHECKOUT_MAX_CONNECTIONS".to_string(), e.to_string())
        })?;
        let order_prefix = get_env_or_default("CHECKOUT_ORDER_PREFIX", DEFAULT_ORDER_PREFIX);
        let default_shipping = get_env_or_default("CHECKOUT_DEFAULT_SHIPPING", "0")
            .parse::<Decimal>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CHECKOUT_DEFAULT_SHIPPING".to_string(), e.to_string())
            })?;

        Ok(Self {
            database_url,
            max_connections,
            order_prefix,
            default_shipping,
        })
    }
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_prefix() {
        assert_eq!(DEFAULT_ORDER_PREFIX, "DW");
    }

    #[test]
    fn test_get_env_or_default_falls_back() {
        let value = get_env_or_default("DRIFTWOOD_TEST_UNSET_VARIABLE", "fallback");
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        // Neither CHECKOUT_TEST_MISSING_URL nor a stand-in exists
        let result = get_database_url("CHECKOUT_TEST_MISSING_URL_THAT_IS_NOT_SET");
        // DATABASE_URL may exist in a developer environment; only assert the
        // error shape when the fallback is also absent.
        if std::env::var("DATABASE_URL").is_err() {
            assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
        }
    }
}
