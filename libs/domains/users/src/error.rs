use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::ErrorResponse;
use axum_helpers::errors::validation_details;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        UserError::Internal(format!("Database error: {}", err))
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            UserError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("not_found", format!("User {} not found", id)),
            ),
            UserError::DuplicateEmail(email) => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "duplicate",
                    format!("User with email '{}' already exists", email),
                ),
            ),
            UserError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("validation_error", "Request validation failed")
                    .with_details(validation_details(errors)),
            ),
            UserError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal_error", "An internal error occurred"),
                )
            }
        };

        body.into_response_with(status)
    }
}
