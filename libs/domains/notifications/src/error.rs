//! Error types for the notifications domain.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors surfaced by notifier construction and dead-letter administration.
///
/// Delivery failures never appear here; they end in the dead-letter store.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Misconfiguration detected while building a notifier.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The broker could not be reached at startup.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Dead-letter record not found.
    #[error("Failed event not found: {0}")]
    FailedEventNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Envelope could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failure reported by an event transport.
///
/// `Display` is the bare cause so it can be stored verbatim as the
/// dead-letter `error` column.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0}")]
    Publish(String),

    #[error("{0}")]
    Connection(String),

    #[error("transport closed")]
    Closed,

    #[error("publish timed out after {0:?}")]
    TimedOut(Duration),

    #[error("delivery cancelled")]
    Cancelled,
}

impl From<redis::RedisError> for TransportError {
    fn from(err: redis::RedisError) -> Self {
        TransportError::Publish(err.to_string())
    }
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(err: sea_orm::DbErr) -> Self {
        NotificationError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Serialization(err.to_string())
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            NotificationError::FailedEventNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Failed event {} not found", id),
            ),
            other => {
                tracing::error!(error = %other, "Notification admin request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "type": error_type,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_displays_bare_cause() {
        let err = TransportError::Publish("connection refused".to_string());
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = NotificationError::FailedEventNotFound(Uuid::nil()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let response = NotificationError::Database("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
