use axum_helpers::Normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Account status
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

/// User entity - matches SQL schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier (UUID v7, time-ordered)
    pub id: Uuid,
    /// Email address, stored trimmed and lowercased (unique)
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New active user from an already normalized request.
    pub fn new(input: CreateUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply_update(&mut self, update: UpdateUser) {
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// DTO for creating a new user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(email, length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

impl Normalize for CreateUser {
    fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
    }
}

/// DTO for updating an existing user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email, length(min = 1, max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub status: Option<UserStatus>,
}

impl Normalize for UpdateUser {
    fn normalize(&mut self) {
        if let Some(email) = self.email.as_mut() {
            *email = normalize_email(email);
        }
        if let Some(first_name) = self.first_name.as_mut() {
            *first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = self.last_name.as_mut() {
            *last_name = last_name.trim().to_string();
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Query parameters for listing users
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Page size (1-100, default 20)
    pub limit: Option<i64>,
    /// Number of users to skip
    pub offset: Option<i64>,
}

impl ListUsersQuery {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;

    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Page of users, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPage {
    pub data: Vec<User>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            first_name: "  Ada ".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[test]
    fn test_create_user_normalization() {
        let mut input = create("  Ada@Example.COM ");
        input.normalize();
        assert_eq!(input.email, "ada@example.com");
        assert_eq!(input.first_name, "Ada");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_user_rejects_bad_input() {
        let mut input = create("not-an-email");
        input.normalize();
        assert!(input.validate().is_err());

        let mut input = create("ada@example.com");
        input.first_name = "   ".to_string();
        input.normalize();
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));

        let mut input = create("ada@example.com");
        input.last_name = "x".repeat(101);
        input.normalize();
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_new_user_defaults() {
        let mut input = create("ada@example.com");
        input.normalize();
        let user = User::new(input);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.created_at, user.updated_at);
        assert_eq!(user.id.get_version_num(), 7);
    }

    #[test]
    fn test_apply_update_is_partial() {
        let mut user = User::new(create("ada@example.com"));
        let before = user.clone();

        user.apply_update(UpdateUser {
            status: Some(UserStatus::Suspended),
            ..Default::default()
        });

        assert_eq!(user.status, UserStatus::Suspended);
        assert_eq!(user.email, before.email);
        assert_eq!(user.first_name, before.first_name);
        assert!(user.updated_at >= before.updated_at);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(UserStatus::Suspended.to_string(), "suspended");
        assert_eq!(UserStatus::from_str("inactive").unwrap(), UserStatus::Inactive);
        assert_eq!(
            serde_json::to_value(UserStatus::Active).unwrap(),
            serde_json::json!("active")
        );
        assert!(serde_json::from_str::<UserStatus>("\"banned\"").is_err());
    }

    #[test]
    fn test_list_query_clamps() {
        assert_eq!(ListUsersQuery::new(None, None).limit(), 20);
        assert_eq!(ListUsersQuery::new(Some(0), None).limit(), 20);
        assert_eq!(ListUsersQuery::new(Some(1000), None).limit(), 100);
        assert_eq!(ListUsersQuery::new(Some(5), Some(-1)).offset(), 0);
    }
}
