//! Core HTTP operations against the upstream
//!
//! One GET per call, no retries: a failed fetch is reported to the caller,
//! which decides whether the next scheduled or miss-triggered refresh should
//! try again.

use futures::StreamExt;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::constants::http::{MAX_BODY_BYTES, MAX_PREALLOCATION};
use crate::errors::{FetchError, FetchResult};

/// HTTP operations handler
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
    timeout_secs: u64,
    max_body_bytes: usize,
}

impl HttpHandler {
    /// Creates a new HttpHandler around a configured client
    ///
    /// `timeout_secs` is only used to describe timeouts in errors; the bound
    /// itself is enforced by the client.
    pub fn new(client: Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }

    /// Set the largest body accepted before the fetch is abandoned
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Fetch the full response body, streaming and concatenating its chunks
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Network`, `FetchError::Timeout` or
    /// `FetchError::Status` if the body cannot be retrieved, and
    /// `FetchError::Network` if it announces or grows past the body limit
    pub async fn get_bytes(&self, url: &Url) -> FetchResult<Vec<u8>> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let announced = response.content_length().unwrap_or(0);
        if announced > self.max_body_bytes as u64 {
            return Err(self.too_large(announced));
        }

        let mut body = Vec::with_capacity((announced as usize).min(MAX_PREALLOCATION));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.classify(e))?;
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.too_large((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// Map a transport failure onto the fetch error taxonomy
    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                seconds: self.timeout_secs,
            }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else {
            FetchError::network(error)
        }
    }

    fn too_large(&self, size: u64) -> FetchError {
        FetchError::network(format!(
            "response body of {} bytes exceeds the {} byte limit",
            size, self.max_body_bytes
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::config::ClientConfig;
    use std::time::Duration;

    fn create_test_handler() -> HttpHandler {
        let config = ClientConfig::default().with_request_timeout(Duration::from_secs(2));
        let client = config.build_http_client().unwrap();
        HttpHandler::new(client, 2)
    }

    /// Test that an unreachable upstream is a network error
    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let handler = create_test_handler();
        // Port 1 on loopback is not listening
        let url = Url::parse("http://127.0.0.1:1/data.gz").unwrap();

        let error = handler.get_bytes(&url).await.unwrap_err();
        assert!(error.is_network(), "unexpected error: {:?}", error);
    }

    /// Serve one canned HTTP response on a loopback port
    async fn serve_once(response: &'static [u8]) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            use tokio::io::{AsyncReadExt, AsyncWriteExt};
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response).await;
            }
        });
        Url::parse(&format!("http://{}/data.gz", addr)).unwrap()
    }

    /// Test that a non-2xx answer maps to a status error
    #[tokio::test]
    async fn test_non_success_status() {
        let url = serve_once(
            b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let handler = create_test_handler();
        assert_eq!(
            handler.get_bytes(&url).await.unwrap_err(),
            FetchError::Status { status: 503 }
        );
    }

    /// Test that an absurd Content-Length is rejected without allocating it
    #[tokio::test]
    async fn test_oversized_content_length_is_rejected() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-length: 4000000000000000\r\nconnection: close\r\n\r\nabc",
        )
        .await;

        let handler = create_test_handler();
        let error = handler.get_bytes(&url).await.unwrap_err();
        assert!(matches!(error, FetchError::Network { .. }), "unexpected error: {:?}", error);
        assert!(error.to_string().contains("exceeds"));
    }

    /// Test that a body growing past the limit is abandoned
    #[tokio::test]
    async fn test_body_over_limit_is_rejected() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\nconnection: close\r\n\r\n0123456789abcdef",
        )
        .await;

        let handler = create_test_handler().with_max_body_bytes(8);
        let error = handler.get_bytes(&url).await.unwrap_err();
        assert!(error.to_string().contains("exceeds"), "unexpected error: {:?}", error);
    }

    /// Test that a body within the limit is returned whole
    #[tokio::test]
    async fn test_body_within_limit() {
        let url = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-length: 3\r\nconnection: close\r\n\r\nabc",
        )
        .await;

        let handler = create_test_handler().with_max_body_bytes(8);
        assert_eq!(handler.get_bytes(&url).await.unwrap(), b"abc".to_vec());
    }
}
