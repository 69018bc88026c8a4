pub mod handlers;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Standard error response structure.
///
/// Every error leaving the API has this shape, whether it comes from a
/// domain error type or from request extraction.
///
/// ```json
/// {
///   "error": {
///     "type": "validation_error",
///     "message": "Request validation failed",
///     "details": {"email": [{"code": "email", "message": null, "params": {}}]}
///   }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error identifier, e.g. `not_found`
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details (validation field errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind: kind.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Pair with a status code as an axum response.
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Errors raised by the shared extractors and fallbacks.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] JsonRejection),

    #[error("Invalid path parameter: {0}")]
    InvalidPath(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidPath(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidJson(rejection) => {
                tracing::debug!(error = %rejection, "Rejected JSON body");
                ErrorResponse::new("bad_request", rejection.body_text())
                    .into_response_with(rejection.status())
            }
            AppError::InvalidPath(msg) => {
                ErrorResponse::new("bad_request", msg).into_response_with(StatusCode::BAD_REQUEST)
            }
            AppError::Validation(errors) => {
                let details = validation_details(&errors);
                ErrorResponse::new("validation_error", "Request validation failed")
                    .with_details(details)
                    .into_response_with(StatusCode::BAD_REQUEST)
            }
            AppError::NotFound(msg) => {
                ErrorResponse::new("not_found", msg).into_response_with(StatusCode::NOT_FOUND)
            }
        }
    }
}

/// Flatten validator field errors into `{field: [{code, message, params}]}`.
pub fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let details = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let entries: Vec<serde_json::Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), serde_json::Value::Array(entries))
        })
        .collect::<serde_json::Map<_, _>>();

    serde_json::Value::Object(details)
}
