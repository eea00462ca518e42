//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Event history settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "cepass_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Event history configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of events retained (zero disables the bound).
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_limit() -> usize {
    cepass_history::DEFAULT_HISTORY_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CEPASS_HOST` overrides `server.host`
/// - `CEPASS_PORT` overrides `server.port`
/// - `CEPASS_LOG_LEVEL` overrides `logging.level`
/// - `CEPASS_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `CEPASS_HISTORY_LIMIT` overrides `history.limit`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("CEPASS_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("CEPASS_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("CEPASS_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("CEPASS_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(limit) = std::env::var("CEPASS_HISTORY_LIMIT") {
        if let Ok(parsed) = limit.parse() {
            config.history.limit = parsed;
        }
    }

    Ok(config)
}

/// Name of the environment variable carrying the platform tracing config.
pub const TRACING_CONFIG_ENV: &str = "K_CONFIG_TRACING";

/// Trace publishing configuration injected by the serving platform.
///
/// The platform publishes its tracing ConfigMap as a JSON object of string
/// values; absence or malformed content must never prevent startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TracingConfig {
    /// Tracing backend ("none", "zipkin", ...).
    pub backend: Option<String>,

    /// Collector endpoint for the zipkin backend.
    #[serde(rename = "zipkin-endpoint")]
    pub zipkin_endpoint: Option<String>,

    /// Whether to publish every span regardless of sample rate.
    pub debug: Option<String>,

    /// Fraction of requests to sample, as a decimal string.
    #[serde(rename = "sample-rate")]
    pub sample_rate: Option<String>,
}

impl TracingConfig {
    /// Reads and parses the tracing configuration from the environment.
    ///
    /// Returns `Ok(None)` when the variable is unset or blank. A parse
    /// failure is returned for the caller to log and ignore.
    pub fn from_env() -> Result<Option<Self>, serde_json::Error> {
        match std::env::var(TRACING_CONFIG_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// Whether debug-level trace publishing was requested.
    pub fn debug_enabled(&self) -> bool {
        self.debug.as_deref() == Some("true")
    }
}
