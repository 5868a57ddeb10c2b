//! Error types for the fuel price proxy
//!
//! This module defines the error types for every component of the application.
//! Upstream errors are cloneable so a single refresh outcome can be handed to
//! every caller waiting on it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors fetching and decoding the upstream dataset
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure reaching upstream
    #[error("Network error reaching upstream: {message}")]
    Network { message: String },

    /// Upstream did not answer within the request timeout
    #[error("Upstream request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Upstream answered with a non-success status
    #[error("Upstream error: HTTP {status}")]
    Status { status: u16 },

    /// Payload is not valid gzip
    #[error("Upstream payload is not valid gzip: {message}")]
    Decompression { message: String },

    /// Payload is not a valid JSON document
    #[error("Upstream payload is not a valid dataset: {message}")]
    Parse { message: String },

    /// The refresh task ended without producing a result
    #[error("Refresh task aborted: {message}")]
    Aborted { message: String },
}

impl FetchError {
    /// Build a network error from any displayable cause
    pub fn network(cause: impl std::fmt::Display) -> Self {
        Self::Network {
            message: cause.to_string(),
        }
    }

    /// Whether the failure happened before a payload was received
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::Status { .. }
        )
    }
}

/// Cache lookups that go through a refresh on miss
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Key still has no value after a successful refresh
    #[error("Data not found: {key}")]
    NotFound { key: String },

    /// Refresh triggered by the miss failed
    #[error(transparent)]
    Refresh(#[from] FetchError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// HTTP client could not be built from the configuration
    #[error("Failed to build HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Lookup error
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Check if the error is transient and a later refresh may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Fetch(e) | AppError::Lookup(LookupError::Refresh(e)) => e.is_network(),
            AppError::Lookup(LookupError::NotFound { .. }) | AppError::Config(_) | AppError::Io(_) => {
                false
            }
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "upstream",
            AppError::Lookup(LookupError::NotFound { .. }) => "not_found",
            AppError::Lookup(LookupError::Refresh(_)) => "upstream",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Lookup result type alias
pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
