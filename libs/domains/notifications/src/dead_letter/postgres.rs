use super::DeadLetterStore;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{EventType, FailedEvent, NewFailedEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement};
use std::str::FromStr;
use uuid::Uuid;

/// PostgreSQL implementation of DeadLetterStore on the `failed_events` table
#[derive(Clone)]
pub struct PostgresDeadLetterStore {
    db: DatabaseConnection,
}

impl PostgresDeadLetterStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct FailedEventRow {
    id: Uuid,
    event_id: Uuid,
    event_type: String,
    user_id: Uuid,
    payload: String,
    error: String,
    attempts: i32,
    created_at: DateTime<Utc>,
    last_error_at: DateTime<Utc>,
}

impl TryFrom<FailedEventRow> for FailedEvent {
    type Error = NotificationError;

    fn try_from(row: FailedEventRow) -> Result<Self, Self::Error> {
        let event_type = EventType::from_str(&row.event_type).map_err(|_| {
            NotificationError::Database(format!("Unknown event type '{}'", row.event_type))
        })?;

        Ok(FailedEvent {
            id: row.id,
            event_id: row.event_id,
            event_type,
            subject_id: row.user_id,
            payload: row.payload,
            error: row.error,
            attempts: row.attempts.max(0) as u32,
            created_at: row.created_at,
            last_error_at: row.last_error_at,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct IdRow {
    id: Uuid,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

#[async_trait]
impl DeadLetterStore for PostgresDeadLetterStore {
    async fn save(&self, record: NewFailedEvent) -> NotificationResult<Uuid> {
        let sql = r#"
            INSERT INTO failed_events
                (event_id, event_type, user_id, payload, error, attempts, last_error_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#;

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                record.event_id.into(),
                record.event_type.to_string().into(),
                record.subject_id.into(),
                record.payload.into(),
                record.error.into(),
                (record.attempts.min(i32::MAX as u32) as i32).into(),
                record.last_error_at.into(),
            ],
        );

        let row = IdRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .ok_or_else(|| NotificationError::Database("Insert returned no id".to_string()))?;

        tracing::info!(failed_event_id = %row.id, event_id = %record.event_id, "Stored failed event");
        Ok(row.id)
    }

    async fn list(&self, limit: u64, offset: u64) -> NotificationResult<(Vec<FailedEvent>, u64)> {
        let count_stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT COUNT(*) AS total FROM failed_events",
            [],
        );
        let total = CountRow::find_by_statement(count_stmt)
            .one(&self.db)
            .await?
            .map(|row| row.total.max(0) as u64)
            .unwrap_or(0);

        let sql = r#"
            SELECT id, event_id, event_type, user_id, payload, error, attempts, created_at, last_error_at
            FROM failed_events
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
        "#;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [(limit as i64).into(), (offset as i64).into()],
        );

        let rows = FailedEventRow::find_by_statement(stmt).all(&self.db).await?;
        let events = rows
            .into_iter()
            .map(FailedEvent::try_from)
            .collect::<NotificationResult<Vec<_>>>()?;

        Ok((events, total))
    }

    async fn delete(&self, id: Uuid) -> NotificationResult<()> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM failed_events WHERE id = $1",
            [id.into()],
        );

        let result = self.db.execute_raw(stmt).await?;
        if result.rows_affected() == 0 {
            return Err(NotificationError::FailedEventNotFound(id));
        }
        Ok(())
    }
}
