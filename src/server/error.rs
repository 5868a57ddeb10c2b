//! HTTP error responses
//!
//! Every failure is answered with a short plain-text body. Upstream detail is
//! logged, never sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error};

use crate::errors::{FetchError, LookupError};

/// Errors a handler can answer with
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Error fetching data")]
    Upstream(#[source] FetchError),

    #[error("Data not found")]
    DataNotFound { key: String },

    #[error("Item not found")]
    ItemNotFound { key: String, id: String },

    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },
}

impl ApiError {
    /// Status code this error is answered with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DataNotFound { .. } | Self::ItemNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn invalid_parameter(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound { key } => Self::DataNotFound { key },
            LookupError::Refresh(e) => Self::Upstream(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream(e) => error!("Request-triggered refresh failed: {}", e),
            Self::DataNotFound { key } => debug!("No data for {}", key),
            Self::ItemNotFound { key, id } => debug!("No item {} in {}", id, key),
            Self::InvalidParameter { .. } => debug!("{}", self),
        }

        (self.status_code(), self.to_string()).into_response()
    }
}

/// Handler result
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// Test lookup error mapping
    #[test]
    fn test_lookup_error_mapping() {
        let not_found: ApiError = LookupError::NotFound {
            key: "nonexistent".to_string(),
        }
        .into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Data not found");

        let failed: ApiError = LookupError::Refresh(FetchError::Timeout { seconds: 30 }).into();
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.to_string(), "Error fetching data");
    }

    /// Test bad parameter is client error
    #[test]
    fn test_bad_parameter_is_client_error() {
        let error = ApiError::invalid_parameter("lat", "north");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "Invalid parameter lat: north");
    }

    /// Test response is plain text
    #[test]
    fn test_response_is_plain_text() {
        let response = ApiError::ItemNotFound {
            key: "postajas".to_string(),
            id: "5".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
    }
}
