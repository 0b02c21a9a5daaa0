//! Service configuration loaded from environment variables.

use std::time::Duration;

use crate::deadline::DEFAULT_UPSTREAM_TIMEOUT;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration shared by every service binary, with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: per service)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `DATABASE_URL` — PostgreSQL URL; unset selects the in-memory store
/// - `DATABASE_CONNECT_ATTEMPTS` — start-up connection attempts (default: `30`)
/// - `ACCOUNT_SERVICE_URL`, `CATALOG_SERVICE_URL`, `ORDER_SERVICE_URL` — peers
/// - `UPSTREAM_TIMEOUT_MS` — deadline for each peer call (default: `3000`)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_connect_attempts: u32,
    pub account_url: String,
    pub catalog_url: String,
    pub order_url: String,
    pub upstream_timeout: Duration,
}

impl ServiceConfig {
    /// Loads configuration from the process environment.
    pub fn from_env(default_port: u16) -> Self {
        Self::from_lookup(default_port, |key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(default_port: u16, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::with_port(default_port);
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match lookup("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_connect_attempts: lookup("DATABASE_CONNECT_ATTEMPTS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_connect_attempts),
            account_url: lookup("ACCOUNT_SERVICE_URL").unwrap_or(defaults.account_url),
            catalog_url: lookup("CATALOG_SERVICE_URL").unwrap_or(defaults.catalog_url),
            order_url: lookup("ORDER_SERVICE_URL").unwrap_or(defaults.order_url),
            upstream_timeout: lookup("UPSTREAM_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.upstream_timeout),
        }
    }

    fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_connect_attempts: 30,
            account_url: "http://localhost:8081".to_string(),
            catalog_url: "http://localhost:8082".to_string(),
            order_url: "http://localhost:8083".to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}
