use axum::{Router, extract::State, response::Response, routing::get};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use domain_notifications::DeadLetterStore;
use domain_users::{UserRepository, UserService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// API routes without the `/api` prefix; `create_router` adds it.
///
/// - `/users`: user CRUD
/// - `/admin/failed-events`: dead-lettered notifications
pub fn routes<R: UserRepository + 'static>(
    users: UserService<R>,
    dead_letters: Arc<dyn DeadLetterStore>,
) -> Router {
    Router::new()
        .nest("/users", domain_users::handlers::router(users))
        .nest("/admin", domain_notifications::handlers::router(dead_letters))
}

/// Readiness check against the database
pub async fn ready_handler(State(db): State<DatabaseConnection>) -> Response {
    let database: HealthCheckFuture<'_> = Box::pin(async {
        db.ping()
            .await
            .map_err(|e| format!("Database ping failed: {}", e))
    });

    run_health_checks(vec![("database", database)]).await
}

/// Router with the `/ready` endpoint
pub fn ready_router(db: DatabaseConnection) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(db)
}
