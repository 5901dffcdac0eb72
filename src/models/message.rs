//! Direct messages exchanged between two users about a listing

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use super::UserResponse;

/// Message model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub sending_user: Uuid,
    pub receiving_user: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub listing_id: Uuid,
    pub sending_user: Uuid,
    pub receiving_user: Uuid,
    pub message: String,
}

/// Body of `POST /messages`.
///
/// Ids arrive as strings so that a malformed id reads as "not found"
/// instead of failing JSON extraction.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub listing: Option<String>,
    pub receiving_user: Option<String>,
    pub message: Option<String>,
}

/// Minimal listing info embedded in a message
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: Uuid,
    pub title: String,
}

/// Message with sender, receiver and listing populated
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub listing: ListingSummary,
    pub sending_user: UserResponse,
    pub receiving_user: UserResponse,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
