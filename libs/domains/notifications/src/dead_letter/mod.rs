//! Dead-letter storage for events whose delivery was exhausted.

mod postgres;

pub use postgres::PostgresDeadLetterStore;

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{FailedEvent, NewFailedEvent};

/// Durable store for failed events.
///
/// Implementations must be safe for concurrent `save` calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    /// Persist a record and return its store-assigned id
    async fn save(&self, record: NewFailedEvent) -> NotificationResult<Uuid>;

    /// Newest-first page of records plus the total count
    async fn list(&self, limit: u64, offset: u64) -> NotificationResult<(Vec<FailedEvent>, u64)>;

    /// Remove a record, failing with `FailedEventNotFound` when absent
    async fn delete(&self, id: Uuid) -> NotificationResult<()>;
}

/// In-memory implementation of DeadLetterStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryDeadLetterStore {
    records: Arc<RwLock<Vec<FailedEvent>>>,
}

impl InMemoryDeadLetterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record in insertion order
    pub async fn records(&self) -> Vec<FailedEvent> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl DeadLetterStore for InMemoryDeadLetterStore {
    async fn save(&self, record: NewFailedEvent) -> NotificationResult<Uuid> {
        let id = Uuid::now_v7();
        let event = FailedEvent::from_new(id, record, Utc::now());

        tracing::info!(
            failed_event_id = %id,
            event_id = %event.event_id,
            event_type = %event.event_type,
            "Stored failed event"
        );

        self.records.write().await.push(event);
        Ok(id)
    }

    async fn list(&self, limit: u64, offset: u64) -> NotificationResult<(Vec<FailedEvent>, u64)> {
        let records = self.records.read().await;
        let total = records.len() as u64;

        let page = records
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn delete(&self, id: Uuid) -> NotificationResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Err(NotificationError::FailedEventNotFound(id));
        }
        Ok(())
    }
}
