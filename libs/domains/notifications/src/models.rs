//! Domain models for user event notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Kind of user lifecycle change being announced.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum EventType {
    #[serde(rename = "user.created")]
    #[strum(serialize = "user.created")]
    UserCreated,
    #[serde(rename = "user.updated")]
    #[strum(serialize = "user.updated")]
    UserUpdated,
    #[serde(rename = "user.deleted")]
    #[strum(serialize = "user.deleted")]
    UserDeleted,
}

/// Payload body of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub subject_id: Uuid,
}

/// One occurrence of a user event.
///
/// Fields are fixed at construction; retries resend the same serialized form.
///
/// ```json
/// {"event_id":"…","event_type":"user.created","timestamp":"2024-05-01T10:00:00Z","data":{"subject_id":"…"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    event_id: Uuid,
    event_type: EventType,
    timestamp: DateTime<Utc>,
    data: EventData,
}

impl EventEnvelope {
    pub fn new(event_type: EventType, subject_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            data: EventData { subject_id },
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn subject_id(&self) -> Uuid {
        self.data.subject_id
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// A dead-letter record before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFailedEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub subject_id: Uuid,
    /// Exact payload that was attempted
    pub payload: String,
    pub error: String,
    pub attempts: u32,
    pub last_error_at: DateTime<Utc>,
}

impl NewFailedEvent {
    pub fn from_envelope(
        envelope: &EventEnvelope,
        payload: String,
        error: String,
        attempts: u32,
        last_error_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: envelope.event_id(),
            event_type: envelope.event_type(),
            subject_id: envelope.subject_id(),
            payload,
            error,
            attempts,
            last_error_at,
        }
    }
}

/// Durable record of an event whose delivery was given up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FailedEvent {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event_type: EventType,
    pub subject_id: Uuid,
    pub payload: String,
    pub error: String,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub last_error_at: DateTime<Utc>,
}

impl FailedEvent {
    pub fn from_new(id: Uuid, record: NewFailedEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            event_id: record.event_id,
            event_type: record.event_type,
            subject_id: record.subject_id,
            payload: record.payload,
            error: record.error,
            attempts: record.attempts,
            created_at,
            last_error_at: record.last_error_at,
        }
    }
}

/// Query parameters for listing failed events
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FailedEventQuery {
    /// Page size (1-100, default 20)
    #[serde(default)]
    pub limit: Option<i64>,
    /// Number of records to skip
    #[serde(default)]
    pub offset: Option<i64>,
}

impl FailedEventQuery {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;

    pub fn limit(&self) -> u64 {
        match self.limit {
            Some(limit) if limit > 0 => (limit as u64).min(Self::MAX_LIMIT),
            _ => Self::DEFAULT_LIMIT,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset.filter(|o| *o > 0).map(|o| o as u64).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Page of failed events, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FailedEventPage {
    pub data: Vec<FailedEvent>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(EventType::UserCreated.to_string(), "user.created");
        assert_eq!(EventType::UserUpdated.as_ref(), "user.updated");
        assert_eq!(
            EventType::from_str("user.deleted").unwrap(),
            EventType::UserDeleted
        );
        assert!(EventType::from_str("user.renamed").is_err());
    }

    #[test]
    fn test_envelope_wire_shape() {
        let subject = Uuid::new_v4();
        let envelope = EventEnvelope::new(EventType::UserCreated, subject);
        let value: serde_json::Value =
            serde_json::from_str(&envelope.to_payload().unwrap()).unwrap();

        assert_eq!(value["event_id"], envelope.event_id().to_string());
        assert_eq!(value["event_type"], "user.created");
        assert_eq!(value["data"]["subject_id"], subject.to_string());
        let timestamp = value["timestamp"].as_str().unwrap();
        assert_eq!(
            DateTime::parse_from_rfc3339(timestamp).unwrap(),
            envelope.timestamp()
        );
    }

    #[test]
    fn test_envelope_payload_is_stable() {
        let envelope = EventEnvelope::new(EventType::UserUpdated, Uuid::new_v4());
        let first = envelope.to_payload().unwrap();
        let second = envelope.to_payload().unwrap();
        assert_eq!(first, second);
        assert_eq!(EventEnvelope::from_payload(&first).unwrap(), envelope);
    }

    #[test]
    fn test_envelopes_get_fresh_ids() {
        let subject = Uuid::new_v4();
        let a = EventEnvelope::new(EventType::UserDeleted, subject);
        let b = EventEnvelope::new(EventType::UserDeleted, subject);
        assert_ne!(a.event_id(), b.event_id());
    }

    #[test]
    fn test_failed_event_query_clamps() {
        let q = FailedEventQuery {
            limit: None,
            offset: None,
        };
        assert_eq!((q.limit(), q.offset()), (20, 0));

        let q = FailedEventQuery {
            limit: Some(500),
            offset: Some(-3),
        };
        assert_eq!((q.limit(), q.offset()), (100, 0));

        let q = FailedEventQuery {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!((q.limit(), q.offset()), (20, 40));
    }
}
