use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{User, UserStatus};
use crate::repository::UserRepository;

const USER_COLUMNS: &str = "id, email, first_name, last_name, status, created_at, updated_at";

/// PostgreSQL implementation of UserRepository using SeaORM raw statements
#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing user rows from the database
#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let status = UserStatus::from_str(&row.status)
            .map_err(|_| UserError::Internal(format!("Unknown user status '{}'", row.status)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct ExistsRow {
    found: bool,
}

fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string();
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

impl PostgresUserRepository {
    async fn fetch_one(&self, stmt: Statement) -> UserResult<Option<User>> {
        UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.id.into(),
                user.email.clone().into(),
                user.first_name.clone().into(),
                user.last_name.clone().into(),
                user.status.to_string().into(),
                user.created_at.into(),
                user.updated_at.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::DuplicateEmail(user.email.clone())
                } else {
                    UserError::from(e)
                }
            })?
            .ok_or_else(|| UserError::Internal("Failed to create user".to_string()))?;

        User::try_from(row)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.fetch_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [id.into()],
        ))
        .await
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        self.fetch_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [email.into()],
        ))
        .await
    }

    async fn list(&self, limit: u64, offset: u64) -> UserResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [(limit as i64).into(), (offset as i64).into()],
        );

        UserRow::find_by_statement(stmt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn count(&self) -> UserResult<u64> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT COUNT(*) AS total FROM users",
            [],
        );

        let total = CountRow::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .map(|row| row.total.max(0) as u64)
            .unwrap_or(0);

        Ok(total)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, status = $5, updated_at = $6
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.id.into(),
                user.email.clone().into(),
                user.first_name.clone().into(),
                user.last_name.clone().into(),
                user.status.to_string().into(),
                user.updated_at.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::DuplicateEmail(user.email.clone())
                } else {
                    UserError::from(e)
                }
            })?
            .ok_or(UserError::NotFound(user.id))?;

        User::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "DELETE FROM users WHERE id = $1",
            [id.into()],
        );

        let result = self.db.execute_raw(stmt).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS found",
            [email.into()],
        );

        let row = ExistsRow::find_by_statement(stmt).one(&self.db).await?;
        Ok(row.is_some_and(|r| r.found))
    }
}
