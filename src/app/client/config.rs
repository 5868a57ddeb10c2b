//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP client
//! used to reach the upstream dataset.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{http, upstream};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the upstream HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Dataset location
    pub dataset_url: Url,
    /// Whole-request timeout, body included
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Skip TLS certificate verification for the upstream
    pub accept_invalid_certs: bool,
    /// Largest response body accepted
    pub max_body_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dataset_url: default_dataset_url(),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            accept_invalid_certs: http::ACCEPT_INVALID_CERTS,
            max_body_bytes: http::MAX_BODY_BYTES,
        }
    }
}

/// Parsed form of [`upstream::DATASET_URL`]
pub fn default_dataset_url() -> Url {
    Url::parse(upstream::DATASET_URL).expect("Dataset URL should be valid")
}

impl ClientConfig {
    /// Point the client at a different dataset location
    pub fn with_dataset_url(mut self, url: Url) -> Self {
        self.dataset_url = url;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> ConfigResult<Client> {
        Client::builder()
            .default_headers(browser_headers()?)
            .user_agent(upstream::USER_AGENT)
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(ConfigError::HttpClient)
    }
}

fn browser_headers() -> ConfigResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream::BROWSER_HEADERS {
        let header_value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
            field: name.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })?;
        headers.insert(HeaderName::from_static(name), header_value);
    }
    Ok(headers)
}
