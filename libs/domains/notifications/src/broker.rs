//! Broker-backed notifier.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dead_letter::DeadLetterStore;
use crate::metrics::DeliveryMetrics;
use crate::models::{EventEnvelope, EventType, NewFailedEvent};
use crate::notifier::UserNotifier;
use crate::policy::{DeliveryOutcome, DeliveryPolicy};
use crate::transport::{EventTransport, OutboundMessage};

/// Publishes user events through an [`EventTransport`] and dead-letters
/// whatever the [`DeliveryPolicy`] gives up on.
#[derive(Clone)]
pub struct BrokerNotifier {
    transport: Arc<dyn EventTransport>,
    store: Arc<dyn DeadLetterStore>,
    policy: DeliveryPolicy,
}

impl BrokerNotifier {
    pub fn new(
        transport: Arc<dyn EventTransport>,
        store: Arc<dyn DeadLetterStore>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            transport,
            store,
            policy,
        }
    }

    pub fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    async fn deliver(&self, envelope: EventEnvelope, payload: String, cancel: &CancellationToken) {
        let event_id = envelope.event_id();
        let event_type = envelope.event_type();
        let message = OutboundMessage::for_envelope(&envelope, payload);

        let max_attempts = self.policy.max_attempts();
        let outcome = self
            .policy
            .run_observed(
                cancel,
                |_| self.transport.publish(&message),
                |attempt, err| {
                    DeliveryMetrics::record_attempt_failed(event_type);
                    warn!(
                        %event_id,
                        %event_type,
                        user_id = %message.key,
                        attempt,
                        max_attempts,
                        error = %err,
                        "Failed to publish user event"
                    );
                },
            )
            .await;

        match outcome {
            DeliveryOutcome::Delivered { attempts } => {
                DeliveryMetrics::record_delivered(event_type, attempts);
                info!(
                    %event_id,
                    %event_type,
                    user_id = %envelope.subject_id(),
                    attempts,
                    transport = self.transport.name(),
                    "Published user event"
                );
            }
            DeliveryOutcome::Exhausted {
                attempts,
                last_error,
                last_error_at,
                cancelled,
            } => {
                warn!(
                    %event_id,
                    %event_type,
                    user_id = %envelope.subject_id(),
                    attempts,
                    cancelled,
                    error = %last_error,
                    "Giving up on user event, writing to dead-letter store"
                );

                let record = NewFailedEvent::from_envelope(
                    &envelope,
                    message.value,
                    last_error.to_string(),
                    attempts,
                    last_error_at,
                );

                match self.store.save(record).await {
                    Ok(id) => {
                        DeliveryMetrics::record_dead_lettered(event_type);
                        info!(%event_id, failed_event_id = %id, "User event dead-lettered");
                    }
                    Err(err) => {
                        DeliveryMetrics::record_dead_letter_failed(event_type);
                        error!(
                            %event_id,
                            %event_type,
                            user_id = %envelope.subject_id(),
                            error = %err,
                            "Failed to store dead-lettered user event; event is lost"
                        );
                    }
                }
            }
        }
    }
}

#[async_trait]
impl UserNotifier for BrokerNotifier {
    async fn notify(&self, event_type: EventType, user_id: Uuid, cancel: &CancellationToken) {
        let envelope = EventEnvelope::new(event_type, user_id);

        let payload = match envelope.to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                error!(
                    event_id = %envelope.event_id(),
                    %event_type,
                    %user_id,
                    error = %err,
                    "Failed to serialize user event"
                );
                return;
            }
        };

        self.deliver(envelope, payload, cancel).await;
    }

    async fn close(&self) {
        self.transport.close().await;
    }

    fn name(&self) -> &'static str {
        "broker"
    }
}
