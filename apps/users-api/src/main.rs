//! Users API - REST server for user management
//!
//! Every committed create, update or delete is announced on the event broker.
//! Deliveries that exhaust their retries are kept in `failed_events` and
//! exposed under `/api/admin/failed-events`.

use axum_helpers::ShutdownCoordinator;
use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::{DeadLetterStore, PostgresDeadLetterStore, build_notifier};
use domain_users::{PostgresUserRepository, UserService};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod metrics;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before any fallible operation
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    metrics::init_metrics()?;

    info!(
        max_connections = config.database.max_connections,
        "Connecting to PostgreSQL"
    );
    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(config.database.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    Migrator::up(&db, None)
        .await
        .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
    info!("Database migrations applied");

    let dead_letters: Arc<dyn DeadLetterStore> =
        Arc::new(PostgresDeadLetterStore::new(db.clone()));

    // A bad broker URL or retry policy stops startup here
    let notifier = build_notifier(&config.notifier, dead_letters.clone()).await?;
    info!(notifier = notifier.name(), "User notifier ready");

    let coordinator = ShutdownCoordinator::new();
    let users = UserService::new(
        PostgresUserRepository::new(db.clone()),
        notifier.clone(),
        coordinator.token(),
    )
    .with_delivery_tracker(coordinator.tracker())
    .with_notify_deadline(config.notify_deadline());

    let apis = api::routes(users, dead_letters);
    let app = axum_helpers::create_router::<openapi::ApiDoc>(apis, &config.server)?
        .merge(health_router(config.app))
        .merge(api::ready_router(db.clone()))
        .merge(metrics::metrics_router());

    info!(
        "Starting {} v{} with graceful shutdown (30s timeout)",
        config.app.name, config.app.version
    );

    create_production_app(
        app,
        &config.server,
        coordinator,
        Duration::from_secs(30),
        async move {
            // Tracked deliveries have been dead-lettered or delivered by now
            notifier.close().await;
            info!("Notifier closed");

            match db.close().await {
                Ok(_) => info!("PostgreSQL connection closed successfully"),
                Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}
