use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use json_swap_core::SwapError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error("maxReplacements must be a positive integer, got '{0}'")]
    InvalidMaxReplacements(String),

    #[error("content type must be application/json")]
    UnsupportedMediaType,

    #[error("request body could not be read: {0}")]
    InvalidBody(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("no route for {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Swap(SwapError::InvalidTokens(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Swap(_) | ApiError::InvalidMaxReplacements(_) | ApiError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Swap(SwapError::DepthLimitExceeded { .. }) => "DEPTH_LIMIT_EXCEEDED",
            ApiError::Swap(SwapError::MalformedJson(_)) => "MALFORMED_JSON",
            ApiError::Swap(SwapError::InvalidTokens(_)) | ApiError::Internal(_) => {
                "INTERNAL_ERROR"
            }
            ApiError::InvalidMaxReplacements(_) => "INVALID_MAX_REPLACEMENTS",
            ApiError::InvalidBody(_) => "INVALID_BODY",
            ApiError::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::NotFound(_) => "NOT_FOUND",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    fn body(&self) -> ErrorResponse {
        let (message, details) = match self {
            ApiError::Swap(SwapError::DepthLimitExceeded { max_depth }) => (
                self.to_string(),
                Some(json!({ "maxDepth": max_depth })),
            ),
            ApiError::PayloadTooLarge { limit } => {
                (self.to_string(), Some(json!({ "limitBytes": limit })))
            }
            ApiError::RateLimited { retry_after_secs } => (
                self.to_string(),
                Some(json!({ "retryAfterSecs": retry_after_secs })),
            ),
            err if err.is_server_error() => ("internal server error".to_string(), None),
            err => (err.to_string(), None),
        };

        ErrorResponse {
            error: message,
            code: self.code().to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(error = %self, "request failed with internal error");
        }

        let mut response = (self.status(), Json(self.body())).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
