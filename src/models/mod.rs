//! Data models for Campus Market backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod auth;
pub mod flag;
pub mod listing;
pub mod message;
pub mod question;

pub use auth::*;
pub use flag::*;
pub use listing::*;
pub use message::*;
pub use question::*;

/// User model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a user. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// The `{ successful, text }` envelope shared by most endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageResponse {
    pub successful: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl MessageResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            successful: true,
            text: text.into(),
            token: None,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            successful: false,
            text: text.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

/// Envelope plus a created resource, used by the create endpoints
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T> {
    pub successful: bool,
    pub text: String,
    #[serde(flatten)]
    pub data: T,
}
