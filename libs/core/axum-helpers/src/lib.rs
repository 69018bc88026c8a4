//! # Axum Helpers
//!
//! Shared HTTP plumbing for the service binaries.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly, health checks, graceful shutdown
//! - **[`errors`]**: The `{"error": {"type", "message"}}` response shape
//! - **[`extractors`]**: UUID path and normalized/validated JSON extractors

pub mod errors;
pub mod extractors;
pub mod server;

// Re-export server types
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

// Re-export error types
pub use errors::{AppError, ErrorBody, ErrorResponse};

// Re-export extractors
pub use extractors::{Normalize, UuidPath, ValidatedJson};
