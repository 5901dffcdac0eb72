//! Listing flags raised by users

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingFlag {
    pub id: Uuid,
    pub description: Option<String>,
    pub user_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewListingFlag {
    pub description: Option<String>,
    pub user_id: Uuid,
    pub listing_id: Option<Uuid>,
}

/// Body of `POST /flags`
#[derive(Debug, Deserialize, Validate, Default)]
pub struct CreateFlagRequest {
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
    pub listing: Option<Uuid>,
}
