//! Error handling for the backend API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cuotiben_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

use crate::services::gateway::GatewayError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid payload: {0}")]
    Validation(#[from] ValidationError),

    #[error("Analysis error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Parse(_) => (StatusCode::BAD_REQUEST, "parse_error"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ApiError::Gateway(e) => match e {
                GatewayError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
                GatewayError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
                GatewayError::Malformed(_) | GatewayError::EmptyOutput => {
                    (StatusCode::BAD_GATEWAY, "malformed_output")
                }
                GatewayError::Unsupported(_) => (StatusCode::BAD_REQUEST, "unsupported_input"),
                GatewayError::Network(_) | GatewayError::Upstream { .. } => {
                    (StatusCode::BAD_GATEWAY, "upstream_error")
                }
            },
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        let error = ApiError::NotFound("entry 123".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_request_status() {
        let error = ApiError::BadRequest("invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_error_status() {
        let error = ApiError::Parse("invalid date".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_status() {
        let error = ApiError::from(ValidationError::MissingField("word"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_gateway_statuses() {
        let cases = [
            (GatewayError::RateLimited("slow down".to_string()), StatusCode::TOO_MANY_REQUESTS),
            (GatewayError::Timeout, StatusCode::GATEWAY_TIMEOUT),
            (GatewayError::EmptyOutput, StatusCode::BAD_GATEWAY),
            (GatewayError::Malformed("not json".to_string()), StatusCode::BAD_GATEWAY),
            (GatewayError::Unsupported("images".to_string()), StatusCode::BAD_REQUEST),
            (
                GatewayError::Upstream {
                    status: 500,
                    message: "boom".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), expected);
        }
    }

    #[test]
    fn test_migration_error_status() {
        let error = ApiError::Migration("migration failed".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_display_not_found() {
        let error = ApiError::NotFound("Entry 123".to_string());
        assert_eq!(error.to_string(), "Not found: Entry 123");
    }

    #[test]
    fn test_error_display_validation() {
        let error = ApiError::from(ValidationError::MissingField("title"));
        assert_eq!(error.to_string(), "Invalid payload: missing title");
    }

    #[test]
    fn test_error_display_gateway() {
        let error = ApiError::from(GatewayError::Timeout);
        assert_eq!(error.to_string(), "Analysis error: upstream request timed out");
    }
}
