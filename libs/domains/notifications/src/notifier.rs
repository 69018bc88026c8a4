//! The notifier seam used by the user service.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::EventType;

/// Announces user lifecycle changes downstream.
///
/// `notify` has no error channel: a failed delivery is dead-lettered or
/// logged, never handed back to the caller.
#[async_trait]
pub trait UserNotifier: Send + Sync {
    /// Deliver one event for `user_id`, retrying per the delivery policy.
    ///
    /// Returns early with a dead-letter record once `cancel` fires.
    async fn notify(&self, event_type: EventType, user_id: Uuid, cancel: &CancellationToken);

    async fn notify_created(&self, user_id: Uuid, cancel: &CancellationToken) {
        self.notify(EventType::UserCreated, user_id, cancel).await
    }

    async fn notify_updated(&self, user_id: Uuid, cancel: &CancellationToken) {
        self.notify(EventType::UserUpdated, user_id, cancel).await
    }

    async fn notify_deleted(&self, user_id: Uuid, cancel: &CancellationToken) {
        self.notify(EventType::UserDeleted, user_id, cancel).await
    }

    /// Release the transport. Idempotent.
    async fn close(&self);

    fn name(&self) -> &'static str;
}
