//! Question and answer models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// A question asked on a listing, answered by its owner
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub asker_id: Uuid,
    pub question: String,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub answered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub listing_id: Uuid,
    pub asker_id: Uuid,
    pub question: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000, message = "Question must be 1-1000 characters"))]
    pub question: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerQuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "Answer must be 1-2000 characters"))]
    pub answer: String,
}
