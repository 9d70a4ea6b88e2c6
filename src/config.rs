//! Application configuration loaded from environment variables.

use axum::http::HeaderValue;
use serde::{Deserialize, Deserializer};

use crate::error::{Result, ServiceError};

/// Port used when neither `FLASK_PORT` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 5000;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server ===
    /// Debug mode. Only the case-insensitive string `true` enables it.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub flask_debug: bool,

    /// Bind host.
    #[serde(default = "default_host")]
    pub flask_host: String,

    /// Bind port, takes precedence over `port`.
    #[serde(default)]
    pub flask_port: Option<u16>,

    /// Bind port set by container platforms.
    #[serde(default)]
    pub port: Option<u16>,

    /// Comma-separated allowed CORS origins, `*` for any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    // === Observability ===
    /// Prometheus scrape listener port, bound on the same host as the HTTP
    /// server. Metrics are not exported when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Log filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit JSON log lines.
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().eq_ignore_ascii_case("true"))
}

/// Which cross-origin requests the server accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin, without credentials.
    Any,
    /// Only the listed origins, with credentials.
    Origins(Vec<String>),
}

impl CorsPolicy {
    /// Parse a comma-separated origin list. `*` anywhere in it means any origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsPolicy::Any
        } else {
            CorsPolicy::Origins(origins)
        }
    }
}

/// Resolved settings handed to [`crate::server::Server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Debug mode: verbose logs and panic details in 500 responses.
    pub debug: bool,
    /// Cross-origin policy.
    pub cors: CorsPolicy,
}

impl ServerConfig {
    /// `host:port` for logging and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            debug: false,
            cors: CorsPolicy::Any,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Effective bind port: `FLASK_PORT`, then `PORT`, then the default.
    pub fn effective_port(&self) -> u16 {
        self.flask_port.or(self.port).unwrap_or(DEFAULT_PORT)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        if self.flask_host.trim().is_empty() {
            return Err(ServiceError::InvalidConfig(
                "FLASK_HOST must not be empty".to_string(),
            ));
        }

        if let CorsPolicy::Origins(origins) = CorsPolicy::parse(&self.cors_origins) {
            if let Some(bad) = origins.iter().find(|o| HeaderValue::from_str(o).is_err()) {
                return Err(ServiceError::InvalidConfig(format!(
                    "CORS_ORIGINS contains an invalid origin: {bad:?}"
                )));
            }
        }

        if self.metrics_port == Some(self.effective_port()) {
            return Err(ServiceError::InvalidConfig(
                "METRICS_PORT must differ from the HTTP port".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve into the settings the server consumes.
    pub fn resolve(&self) -> ServerConfig {
        ServerConfig {
            host: self.flask_host.trim().to_string(),
            port: self.effective_port(),
            debug: self.flask_debug,
            cors: CorsPolicy::parse(&self.cors_origins),
        }
    }
}
