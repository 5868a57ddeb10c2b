//! Configuration management for the fuel price proxy
//!
//! Settings are resolved from several sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. Config file (explicit `--config`, else the first of the search paths)
//! 3. Environment variables (`PORT`, `HOST`)
//! 4. CLI arguments

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{CacheConfig, ClientConfig};
use crate::constants::{env, http, logging, refresh, server};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listening address
    pub server: ServerConfig,
    /// Upstream HTTP client settings
    pub upstream: UpstreamConfigToml,
    /// Refresh and expiry settings
    pub refresh: RefreshConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Listening address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host (IP address)
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
        }
    }
}

/// TOML-friendly upstream client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfigToml {
    /// Whole-request timeout, e.g. `"30s"`
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connection establishment timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Skip TLS certificate verification against the upstream
    pub accept_invalid_certs: bool,
    /// Largest compressed payload accepted, in bytes
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfigToml {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            accept_invalid_certs: http::ACCEPT_INVALID_CERTS,
            max_body_bytes: http::MAX_BODY_BYTES,
        }
    }
}

/// TOML-friendly refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfigToml {
    /// Time between scheduled refreshes, e.g. `"24h"`
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Local hour at which cached entries expire
    pub rollover_hour: u32,
    /// Local minute at which cached entries expire
    pub rollover_minute: u32,
    /// Drop expired entries after every refresh
    pub purge_expired: bool,
}

impl Default for RefreshConfigToml {
    fn default() -> Self {
        Self {
            interval: refresh::INTERVAL,
            rollover_hour: refresh::ROLLOVER_HOUR,
            rollover_minute: refresh::ROLLOVER_MINUTE,
            purge_expired: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl LoggingConfig {
    /// The configured level, parsed
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the level is not a tracing level
    pub fn parsed_level(&self) -> ConfigResult<tracing::Level> {
        self.level
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.level.clone(),
                reason: "Expected one of trace, debug, info, warn, error".to_string(),
            })
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, CacheConfig) {
        (
            self.upstream.to_runtime_config(),
            self.refresh.to_runtime_config(),
        )
    }

    /// Load configuration from defaults, the config file and the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an explicitly given file is missing, a file
    /// cannot be read or parsed, or a value is out of range
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) if path.exists() => Some(path),
            Some(path) => return Err(ConfigError::NotFound { path }),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PORT` and `HOST` from the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `PORT` is not a port number
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(env::PORT) {
            self.server.port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: env::PORT.to_string(),
                    value: port.clone(),
                    reason: e.to_string(),
                })?;
            debug!("Port overridden from environment: {}", self.server.port);
        }

        if let Some(host) = lookup(env::HOST) {
            debug!("Host overridden from environment: {}", host);
            self.server.host = host;
        }

        Ok(())
    }

    /// Apply `--host` and `--port` from the command line
    pub fn apply_cli_overrides(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
    }

    /// Reject values the runtime cannot work with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field: &str, value: String, reason: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            value,
            reason: reason.to_string(),
        };

        if self.refresh.interval.is_zero() {
            return Err(invalid(
                "refresh.interval",
                "0s".to_string(),
                "Refresh interval must be positive",
            ));
        }
        if !self.refresh.to_runtime_config().is_valid() {
            return Err(invalid(
                "refresh.rollover",
                format!(
                    "{:02}:{:02}",
                    self.refresh.rollover_hour, self.refresh.rollover_minute
                ),
                "Rollover must be a valid time of day",
            ));
        }
        if self.upstream.request_timeout.is_zero() {
            return Err(invalid(
                "upstream.request_timeout",
                "0s".to_string(),
                "Request timeout must be positive",
            ));
        }
        self.logging.parsed_level()?;
        if self.upstream.max_body_bytes == 0 {
            return Err(invalid(
                "upstream.max_body_bytes",
                "0".to_string(),
                "Body limit must be positive",
            ));
        }

        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![
            PathBuf::from("./fuel-proxy.toml"),
            PathBuf::from("./config.toml"),
        ];
        if let Some(path) = Self::user_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Config file path for the current user, if a config directory exists
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fuel-proxy").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }
}

impl UpstreamConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            accept_invalid_certs: self.accept_invalid_certs,
            max_body_bytes: self.max_body_bytes,
            ..ClientConfig::default()
        }
    }
}

impl RefreshConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_rollover(self.rollover_hour, self.rollover_minute)
            .with_purge_after_refresh(self.purge_expired)
    }
}
