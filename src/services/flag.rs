use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::db::Store;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateFlagRequest, ListingFlag, NewListingFlag};

#[derive(Clone)]
pub struct FlagService {
    store: Arc<dyn Store>,
}

impl FlagService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn flag(&self, reporter: Uuid, request: CreateFlagRequest) -> ApiResult<ListingFlag> {
        request.validate()?;

        if let Some(listing_id) = request.listing {
            if self.store.find_listing(listing_id).await?.is_none() {
                return Err(ApiError::BadRequest("Could not find listing.".to_string()));
            }
        }

        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let flag = self
            .store
            .insert_flag(NewListingFlag {
                description,
                user_id: reporter,
                listing_id: request.listing,
            })
            .await?;

        tracing::warn!(flag_id = %flag.id, listing_id = ?flag.listing_id, user_id = %reporter, "Listing flagged");
        Ok(flag)
    }
}
