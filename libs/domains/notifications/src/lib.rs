//! Notifications Domain
//!
//! Delivers user lifecycle events (`user.created`, `user.updated`,
//! `user.deleted`) to a message broker after the user change is committed.
//! Delivery is retried with exponential backoff; whatever still fails is
//! written to a dead-letter store. Callers never see a delivery error.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   UserService   │  ← calls notify after a successful mutation
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  UserNotifier   │  ← NoopNotifier | BrokerNotifier
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ DeliveryPolicy  │  ← 3 attempts, 1s initial delay, x2 backoff
//! └───┬─────────┬───┘
//!     │ ok      │ exhausted
//! ┌───▼─────┐ ┌─▼───────────────┐
//! │Transport│ │ DeadLetterStore │  ← failed_events table
//! └─────────┘ └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{build_notifier, PostgresDeadLetterStore};
//!
//! let store = Arc::new(PostgresDeadLetterStore::new(db.clone()));
//! let notifier = build_notifier(&config.notifier, store).await?;
//!
//! notifier.notify_created(user.id, &shutdown.child_token()).await;
//! ```

pub mod broker;
pub mod dead_letter;
pub mod error;
pub mod factory;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod noop;
pub mod notifier;
pub mod policy;
pub mod transport;

// Re-export commonly used types
pub use broker::BrokerNotifier;
pub use dead_letter::{DeadLetterStore, InMemoryDeadLetterStore, PostgresDeadLetterStore};
pub use error::{NotificationError, NotificationResult, TransportError};
pub use factory::build_notifier;
pub use models::{EventEnvelope, EventType, FailedEvent, NewFailedEvent};
pub use noop::NoopNotifier;
pub use notifier::UserNotifier;
pub use policy::{DeliveryOutcome, DeliveryPolicy, DeliveryState};
pub use transport::{EventTransport, OutboundMessage, RedisStreamTransport};
pub use tokio_util::sync::CancellationToken;
