use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::EventType;
use crate::notifier::UserNotifier;

/// Notifier used when no broker is configured. Does no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    pub fn new() -> Self {
        tracing::info!("User event notifications disabled: EVENTS_BROKER_URL not configured");
        Self
    }
}

#[async_trait]
impl UserNotifier for NoopNotifier {
    async fn notify(&self, event_type: EventType, user_id: Uuid, _cancel: &CancellationToken) {
        tracing::trace!(%event_type, %user_id, "Skipping user event, notifications disabled");
    }

    async fn close(&self) {}

    fn name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_noop_returns_immediately() {
        let notifier = NoopNotifier::new();
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();
        let id = Uuid::new_v4();

        notifier.notify_created(id, &cancel).await;
        notifier.notify_updated(id, &cancel).await;
        notifier.notify_deleted(id, &cancel).await;
        notifier.close().await;
        notifier.close().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(notifier.name(), "noop");
    }
}
