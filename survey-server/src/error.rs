//! Error types for survey-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use survey_common::FieldErrors;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Answers failed validation (422)
    ///
    /// `redirect` names the step the participant should return to.
    #[error("Validation failed: {errors}")]
    Validation {
        errors: FieldErrors,
        redirect: Option<&'static str>,
    },

    /// Submission storage unavailable (503)
    #[error("Submission failed: {0}")]
    Unavailable(FieldErrors),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// survey-common error
    #[error("Common error: {0}")]
    Common(#[from] survey_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Field errors are returned to the form, not as an error envelope
        let (status, error_code, message) = match self {
            ApiError::Validation { errors, redirect } => {
                let body = Json(json!({ "errors": errors, "redirect": redirect }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            ApiError::Unavailable(errors) => {
                let body = Json(json!({ "errors": errors }));
                return (StatusCode::SERVICE_UNAVAILABLE, body).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(err) => match err {
                survey_common::Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
                survey_common::Error::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
                }
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    other.to_string(),
                ),
            },
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
