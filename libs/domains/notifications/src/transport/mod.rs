//! Event transports.
//!
//! A transport hands one serialized envelope to the broker. It knows nothing
//! about retries; the notifier drives those through the delivery policy.

mod redis_stream;

pub use redis_stream::RedisStreamTransport;

use crate::error::TransportError;
use crate::models::EventEnvelope;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const EVENT_TYPE_HEADER: &str = "event-type";

/// A keyed message ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Routing key; the subject id so one user's events stay together.
    pub key: String,
    pub value: String,
    pub headers: BTreeMap<String, String>,
}

impl OutboundMessage {
    pub fn for_envelope(envelope: &EventEnvelope, payload: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            CONTENT_TYPE_HEADER.to_string(),
            "application/json".to_string(),
        );
        headers.insert(
            EVENT_TYPE_HEADER.to_string(),
            envelope.event_type().to_string(),
        );

        Self {
            key: envelope.subject_id().to_string(),
            value: payload,
            headers,
        }
    }
}

/// Publish capability for user events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Publish one message. Every error is treated as retryable.
    async fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError>;

    /// Release the underlying connection. Later publishes fail with `Closed`.
    async fn close(&self);

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}
