//! Admin endpoints for inspecting and clearing failed events.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use axum_helpers::UuidPath;
use std::sync::Arc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::dead_letter::DeadLetterStore;
use crate::error::NotificationResult;
use crate::models::{EventType, FailedEvent, FailedEventPage, FailedEventQuery, Pagination};

pub const TAG: &str = "failed-events";

/// OpenAPI documentation for the dead-letter admin API
#[derive(OpenApi)]
#[openapi(
    paths(list_failed_events, delete_failed_event),
    components(schemas(FailedEvent, FailedEventPage, Pagination, EventType)),
    tags((name = TAG, description = "Dead-lettered user events"))
)]
pub struct ApiDoc;

/// Router mounted under `/admin`
pub fn router(store: Arc<dyn DeadLetterStore>) -> Router {
    Router::new()
        .route("/failed-events", get(list_failed_events))
        .route("/failed-events/{id}", delete(delete_failed_event))
        .with_state(store)
}

/// List failed events, newest first
#[utoipa::path(
    get,
    path = "/failed-events",
    tag = TAG,
    params(FailedEventQuery),
    responses(
        (status = 200, description = "Page of failed events", body = FailedEventPage),
        (status = 500, description = "Store unavailable")
    )
)]
async fn list_failed_events(
    State(store): State<Arc<dyn DeadLetterStore>>,
    Query(query): Query<FailedEventQuery>,
) -> NotificationResult<Json<FailedEventPage>> {
    let limit = query.limit();
    let offset = query.offset();
    let (data, total) = store.list(limit, offset).await?;

    Ok(Json(FailedEventPage {
        data,
        pagination: Pagination {
            total,
            limit,
            offset,
        },
    }))
}

/// Delete a failed event after it has been handled
#[utoipa::path(
    delete,
    path = "/failed-events/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Failed event ID")),
    responses(
        (status = 204, description = "Failed event deleted"),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Failed event not found")
    )
)]
async fn delete_failed_event(
    State(store): State<Arc<dyn DeadLetterStore>>,
    UuidPath(id): UuidPath,
) -> NotificationResult<impl IntoResponse> {
    store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
