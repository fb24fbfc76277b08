/// Unified error handling module
use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure talking to the upstream event API
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// A response arrived but its status was not 200
    #[error("upstream responded with status {0}")]
    Status(u16),

    /// No usable response: connect, DNS, timeout or body decode failure
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error fetching data from USGS API")]
    UpstreamStatus(u16),

    #[error("Error fetching data from USGS API: {0}")]
    UpstreamUnreachable(reqwest::Error),

    #[error("{0} configuration not found")]
    LocationNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // from_u16 rejects anything outside 100..=999
            ApiError::UpstreamStatus(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::UpstreamUnreachable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::LocationNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status(code) => ApiError::UpstreamStatus(code),
            UpstreamError::Request(e) => ApiError::UpstreamUnreachable(e),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_propagated() {
        let err = ApiError::UpstreamStatus(503);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Error fetching data from USGS API");
    }

    #[test]
    fn test_out_of_range_upstream_status() {
        let err = ApiError::UpstreamStatus(1000);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_location_not_found_message() {
        let err = ApiError::LocationNotFound("Atlantis".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Atlantis configuration not found");
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        let err = ApiError::InvalidInput("limit must be at least 1".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_from_upstream_status() {
        let err: ApiError = UpstreamError::Status(404).into();
        assert!(matches!(err, ApiError::UpstreamStatus(404)));
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ApiError::LocationNotFound("Mars".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Mars configuration not found"}));
    }
}
