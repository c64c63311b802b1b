use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use crate::config::Environment;
use crate::models::BlockQuery;
use crate::upstream::UpstreamError;
use crate::validation::ValidationError;

/// Message sent instead of upstream details when they must stay private.
pub const GENERIC_SERVER_ERROR: &str = "Server error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(ValidationError),

    #[error("An error occurred while fetching {operation}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    #[error("API endpoint not found")]
    NotFound { path: String },

    #[error("Too many requests from this IP, please try again later")]
    RateLimited,
}

impl ApiError {
    /// Upstream failure for `query`, with the detail kept only where the
    /// environment allows it.
    pub fn upstream(query: &BlockQuery, err: &UpstreamError, environment: Environment) -> Self {
        let message = if environment.exposes_error_details() {
            err.to_string()
        } else {
            GENERIC_SERVER_ERROR.to_string()
        };

        ApiError::Upstream {
            operation: query.operation(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            ApiError::Upstream { message, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string(), "message": message }),
            ),
            ApiError::NotFound { path } => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string(), "path": path }),
            ),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

// Implement From<ValidationError> for ApiError
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}
