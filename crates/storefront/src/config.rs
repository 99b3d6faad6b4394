//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back
//!   to `DATABASE_URL`)
//! - `ORDER_WEBHOOK_URL` - Order-processing webhook endpoint
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8080)
//! - `ORDER_WEBHOOK_TIMEOUT_SECS` - Webhook request timeout (default: 10)
//! - `CART_SYNC_DEBOUNCE_MS` - Cart write coalescing window (default: 300)
//! - `CART_SESSION_TTL_SECS` - Idle cart session lifetime (default: 1800)
//! - `TELEGRAM_BOT_TOKEN` - Bot token for init-data signature verification;
//!   when unset, signatures are not checked (development mode)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

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
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Order-processing webhook configuration
    pub webhook: WebhookConfig,
    /// Cart write coalescing window
    pub sync_debounce: Duration,
    /// Idle lifetime of a cart session before eviction
    pub session_ttl: Duration,
    /// Telegram bot token for init-data verification (unset = dev mode)
    pub telegram_bot_token: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Order-processing webhook configuration.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Endpoint receiving confirmed orders.
    pub url: Url,
    /// Fixed request timeout.
    pub timeout: Duration,
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("STOREFRONT_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_owned(), e.to_string()))?;

        let webhook = WebhookConfig::from_env()?;
        let sync_debounce =
            Duration::from_millis(get_parsed_or_default("CART_SYNC_DEBOUNCE_MS", 300)?);
        let session_ttl =
            Duration::from_secs(get_parsed_or_default("CART_SESSION_TTL_SECS", 1800)?);
        let telegram_bot_token = get_optional_env("TELEGRAM_BOT_TOKEN").map(SecretString::from);
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            webhook,
            sync_debounce,
            session_ttl,
            telegram_bot_token,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl WebhookConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("ORDER_WEBHOOK_URL")?;
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("ORDER_WEBHOOK_URL".to_owned(), e.to_string()))?;
        let timeout = Duration::from_secs(get_parsed_or_default("ORDER_WEBHOOK_TIMEOUT_SECS", 10)?);

        Ok(Self { url, timeout })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get an integer environment variable with a default value.
fn get_parsed_or_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/lepestok"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            webhook: WebhookConfig {
                url: Url::parse("https://orders.example.com/orderhook/new").unwrap(),
                timeout: Duration::from_secs(10),
            },
            sync_debounce: Duration::from_millis(300),
            session_ttl: Duration::from_secs(1800),
            telegram_bot_token: None,
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = sample_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_webhook_defaults() {
        let config = sample_config();
        assert_eq!(config.webhook.timeout, Duration::from_secs(10));
        assert_eq!(config.sync_debounce, Duration::from_millis(300));
    }
}
