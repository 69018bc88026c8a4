//! Users Domain
//!
//! User management with lifecycle notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌──────────────┐
//! │   Service   │ ───► │ UserNotifier │  ← after each committed mutation
//! └──────┬──────┘      └──────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//! use domain_notifications::NoopNotifier;
//!
//! let service = UserService::new(
//!     InMemoryUserRepository::new(),
//!     Arc::new(NoopNotifier::new()),
//!     shutdown.token(),
//! );
//!
//! let router = Router::new().nest("/users", handlers::router(service));
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use models::{CreateUser, ListUsersQuery, UpdateUser, User, UserPage, UserStatus};
pub use postgres::PostgresUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
