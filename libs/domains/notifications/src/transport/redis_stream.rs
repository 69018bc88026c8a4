//! Redis Streams transport.
//!
//! Each envelope becomes one stream entry:
//!
//! ```text
//! XADD user-events MAXLEN ~ 100000 * key <subject_id> value <json> header:content-type application/json header:event-type user.created
//! ```

use super::{EventTransport, OutboundMessage};
use crate::error::TransportError;
use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Publishes user events to a Redis stream.
///
/// The connection is opened once in [`RedisStreamTransport::connect`] and
/// dropped on the first [`EventTransport::close`].
pub struct RedisStreamTransport {
    connection: RwLock<Option<ConnectionManager>>,
    stream: String,
    max_length: u64,
}

impl RedisStreamTransport {
    /// Connect to the broker and verify it with `PING`.
    pub async fn connect(
        url: &str,
        stream: impl Into<String>,
        max_length: u64,
    ) -> Result<Self, TransportError> {
        let stream = stream.into();
        info!(stream = %stream, "Connecting event transport to Redis");

        let client = Client::open(url).map_err(|e| TransportError::Connection(e.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let mut conn = manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        info!(stream = %stream, "Event transport connected");

        Ok(Self::from_connection(manager, stream, max_length))
    }

    pub fn from_connection(
        connection: ConnectionManager,
        stream: impl Into<String>,
        max_length: u64,
    ) -> Self {
        Self {
            connection: RwLock::new(Some(connection)),
            stream: stream.into(),
            max_length,
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub async fn is_closed(&self) -> bool {
        self.connection.read().await.is_none()
    }
}

#[async_trait]
impl EventTransport for RedisStreamTransport {
    async fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        // ConnectionManager clones share one multiplexed connection
        let mut conn = match self.connection.read().await.as_ref() {
            Some(conn) => conn.clone(),
            None => return Err(TransportError::Closed),
        };

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg("key")
            .arg(&message.key)
            .arg("value")
            .arg(&message.value);
        for (name, value) in &message.headers {
            cmd.arg(format!("header:{name}")).arg(value);
        }

        let entry_id: String = cmd.query_async(&mut conn).await?;

        debug!(
            stream = %self.stream,
            entry_id = %entry_id,
            key = %message.key,
            "Published event to stream"
        );
        Ok(())
    }

    async fn close(&self) {
        if self.connection.write().await.take().is_some() {
            info!(stream = %self.stream, "Event transport closed");
        }
    }

    fn name(&self) -> &'static str {
        "redis-stream"
    }
}
