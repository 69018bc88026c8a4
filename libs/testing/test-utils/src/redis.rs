//! Redis test infrastructure
//!
//! `TestRedis` starts a Redis container and offers helpers for reading
//! back the streams the event transport writes to.

use redis::Client;
use redis::aio::MultiplexedConnection;
use std::collections::HashMap;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::redis::Redis;

/// One stream entry: id plus its field map
pub type StreamEntry = (String, HashMap<String, String>);

/// Test Redis wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
pub struct TestRedis {
    #[allow(dead_code)]
    container: ContainerAsync<Redis>,
    connection: MultiplexedConnection,
    pub connection_string: String,
}

impl TestRedis {
    /// Start a Redis 8 Alpine container
    pub async fn new() -> Self {
        let container = Redis::default()
            .with_tag("8-alpine")
            .start()
            .await
            .expect("Failed to start Redis container");

        let host_port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        let connection_string = format!("redis://127.0.0.1:{}", host_port);

        let connection = Client::open(connection_string.clone())
            .expect("Failed to create Redis client")
            .get_multiplexed_async_connection()
            .await
            .expect("Failed to connect to Redis");

        tracing::info!(port = host_port, "Test Redis ready (Redis 8-alpine)");

        Self {
            container,
            connection,
            connection_string,
        }
    }

    /// Get a cloned connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// Get the connection string for manual client creation
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// All entries of `stream`, oldest first (`XRANGE stream - +`)
    pub async fn stream_entries(&self, stream: &str) -> Vec<StreamEntry> {
        let mut conn = self.connection();
        redis::cmd("XRANGE")
            .arg(stream)
            .arg("-")
            .arg("+")
            .query_async(&mut conn)
            .await
            .expect("Failed to read stream")
    }
}

// Container is automatically cleaned up when TestRedis is dropped
impl Drop for TestRedis {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Redis container");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn test_stream_entries_round_trip() {
        let redis = TestRedis::new().await;
        let mut conn = redis.connection();

        let _: String = redis::cmd("XADD")
            .arg("events")
            .arg("*")
            .arg("key")
            .arg("abc")
            .query_async(&mut conn)
            .await
            .unwrap();

        let entries = redis.stream_entries("events").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1["key"], "abc");
        assert!(redis.stream_entries("missing").await.is_empty());
    }
}
