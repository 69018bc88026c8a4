//! Picks the notifier variant from configuration.

use core_config::notifier::NotifierConfig;
use std::sync::Arc;
use tracing::info;

use crate::broker::BrokerNotifier;
use crate::dead_letter::DeadLetterStore;
use crate::error::NotificationResult;
use crate::noop::NoopNotifier;
use crate::notifier::UserNotifier;
use crate::policy::DeliveryPolicy;
use crate::transport::{EventTransport, RedisStreamTransport};

/// Build the notifier for this process.
///
/// Without a broker URL this is a [`NoopNotifier`]. Otherwise the transport
/// is connected here and a failure to connect is returned to the caller.
pub async fn build_notifier(
    config: &NotifierConfig,
    store: Arc<dyn DeadLetterStore>,
) -> NotificationResult<Arc<dyn UserNotifier>> {
    let Some(url) = config.broker_url.as_deref() else {
        return Ok(Arc::new(NoopNotifier::new()));
    };

    let policy = DeliveryPolicy::try_from(config)?;
    let transport =
        RedisStreamTransport::connect(url, config.stream.clone(), config.stream_max_length)
            .await?;

    Ok(Arc::new(with_transport(Arc::new(transport), store, policy)))
}

/// Wire a broker notifier around an already-open transport.
pub fn with_transport(
    transport: Arc<dyn EventTransport>,
    store: Arc<dyn DeadLetterStore>,
    policy: DeliveryPolicy,
) -> BrokerNotifier {
    info!(
        transport = transport.name(),
        max_attempts = policy.max_attempts(),
        initial_delay_ms = policy.initial_delay().as_millis() as u64,
        backoff_multiplier = policy.backoff_multiplier(),
        "User event notifications enabled"
    );
    BrokerNotifier::new(transport, store, policy)
}
