//! HTTP client for the upstream fuel price dataset
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: the single streaming GET against the upstream
//! - `decode`: gzip and JSON decoding of the payload
//!
//! [`DatasetSource`] is the seam the refresher depends on, so tests can drive
//! refreshes without network access.

use std::fmt::Debug;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::app::dataset::Dataset;
use crate::errors::{ConfigResult, FetchResult};

// Module declarations
pub mod config;
pub mod decode;
pub mod http;

pub use config::ClientConfig;
pub use decode::decode_dataset;

use http::HttpHandler;

/// Anything that can produce a fresh copy of the dataset
#[async_trait]
pub trait DatasetSource: Send + Sync + Debug {
    /// Fetch and decode the whole dataset
    async fn fetch_dataset(&self) -> FetchResult<Dataset>;
}

/// HTTP client for the upstream dataset
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http_handler: HttpHandler,
    dataset_url: Url,
}

impl UpstreamClient {
    /// Creates a client with the default configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if HTTP client creation fails
    pub fn new() -> ConfigResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if HTTP client creation fails
    pub fn with_config(config: ClientConfig) -> ConfigResult<Self> {
        if config.accept_invalid_certs {
            warn!(
                "TLS certificate verification is DISABLED for the upstream {}; \
                 set upstream.accept_invalid_certs = false to enforce it",
                config.dataset_url
            );
        }

        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.request_timeout.as_secs())
            .with_max_body_bytes(config.max_body_bytes);

        info!("Created upstream client for {}", config.dataset_url);

        Ok(Self {
            http_handler,
            dataset_url: config.dataset_url,
        })
    }

    /// Get the dataset URL
    pub fn dataset_url(&self) -> &Url {
        &self.dataset_url
    }
}

#[async_trait]
impl DatasetSource for UpstreamClient {
    async fn fetch_dataset(&self) -> FetchResult<Dataset> {
        let payload = self.http_handler.get_bytes(&self.dataset_url).await?;
        let dataset = decode_dataset(&payload)?;
        info!(
            "Fetched dataset from {} ({} compressed bytes)",
            self.dataset_url,
            payload.len()
        );
        Ok(dataset)
    }
}
