//! Listing and offer models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Largest accepted price, in cents ($10,000,000.00)
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Listing model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub sold: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
}

/// Listing as seen by a particular caller
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub is_owner: bool,
}

impl ListingView {
    pub fn for_viewer(listing: Listing, viewer: Uuid) -> Self {
        let is_owner = listing.owner_id == viewer;
        Self { listing, is_owner }
    }
}

/// Offer model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOffer {
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub price_cents: i64,
}

/// A price as clients send it: a JSON number or a numeric string, in dollars.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    /// Convert to whole cents, rejecting anything negative, non-finite or absurd.
    pub fn to_cents(&self) -> Result<i64, String> {
        let dollars = match self {
            PriceInput::Number(n) => *n,
            PriceInput::Text(s) => s
                .trim()
                .trim_start_matches('$')
                .parse::<f64>()
                .map_err(|_| format!("Invalid price: '{}'", s))?,
        };

        if !dollars.is_finite() || dollars < 0.0 {
            return Err("Price must be a non-negative number".to_string());
        }

        let cents = (dollars * 100.0).round();
        if cents > MAX_PRICE_CENTS as f64 {
            return Err("Price is too large".to_string());
        }

        Ok(cents as i64)
    }
}

/// Body of `POST /listings`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateListingRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description is too long"))]
    #[serde(default)]
    pub description: String,
    pub price: PriceInput,
}

/// Body of `PUT /listings/:id`
#[derive(Debug, Deserialize, Validate, Default)]
pub struct UpdateListingRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub sold: Option<bool>,
}

/// Body of `POST /listings/:id/offers`
#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub price: Option<PriceInput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_from_number_and_text() {
        assert_eq!(PriceInput::Number(12.5).to_cents(), Ok(1250));
        assert_eq!(PriceInput::Text("12.50".to_string()).to_cents(), Ok(1250));
        assert_eq!(PriceInput::Text(" $3 ".to_string()).to_cents(), Ok(300));
        assert_eq!(PriceInput::Number(0.0).to_cents(), Ok(0));
    }

    #[test]
    fn test_price_rejects_garbage() {
        assert!(PriceInput::Number(-1.0).to_cents().is_err());
        assert!(PriceInput::Number(f64::NAN).to_cents().is_err());
        assert!(PriceInput::Text("ten dollars".to_string()).to_cents().is_err());
        assert!(PriceInput::Number(1e12).to_cents().is_err());
    }

    #[test]
    fn test_price_deserializes_untagged() {
        let number: PriceInput = serde_json::from_str("19.99").unwrap();
        assert_eq!(number, PriceInput::Number(19.99));
        let text: PriceInput = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(text.to_cents(), Ok(1999));
    }
}
