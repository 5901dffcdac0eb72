//! Listings and the offers made on them

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::db::Store;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateListingRequest, CreateOfferRequest, Listing, ListingView, NewListing, NewOffer, Offer,
    UpdateListingRequest,
};

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn Store>,
}

impl ListingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Fetch a listing or fail with 404
    pub async fn find(&self, id: Uuid) -> ApiResult<Listing> {
        self.store
            .find_listing(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))
    }

    pub async fn list(&self, viewer: Uuid) -> ApiResult<Vec<ListingView>> {
        let listings = self.store.list_listings().await?;
        Ok(annotate(listings, viewer))
    }

    pub async fn list_for_owner(&self, owner_id: Uuid, viewer: Uuid) -> ApiResult<Vec<ListingView>> {
        let listings = self.store.list_listings_by_owner(owner_id).await?;
        Ok(annotate(listings, viewer))
    }

    pub async fn get(&self, id: Uuid, viewer: Uuid) -> ApiResult<ListingView> {
        let listing = self.find(id).await?;
        Ok(ListingView::for_viewer(listing, viewer))
    }

    pub async fn create(&self, owner_id: Uuid, request: CreateListingRequest) -> ApiResult<Listing> {
        request.validate()?;
        let price_cents = request.price.to_cents().map_err(ApiError::BadRequest)?;

        let listing = self
            .store
            .insert_listing(NewListing {
                owner_id,
                title: request.title.trim().to_string(),
                description: request.description,
                price_cents,
            })
            .await?;

        tracing::info!(listing_id = %listing.id, owner_id = %owner_id, "Listing created");
        Ok(listing)
    }

    /// Apply the provided fields; only the owner may edit.
    pub async fn edit(
        &self,
        id: Uuid,
        editor: Uuid,
        request: UpdateListingRequest,
    ) -> ApiResult<Listing> {
        request.validate()?;
        let mut listing = self.find(id).await?;

        if listing.owner_id != editor {
            return Err(ApiError::Forbidden(
                "Only the owner can edit this listing".to_string(),
            ));
        }

        if let Some(title) = request.title {
            listing.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            listing.description = description;
        }
        if let Some(price) = request.price {
            listing.price_cents = price.to_cents().map_err(ApiError::BadRequest)?;
        }
        if let Some(sold) = request.sold {
            listing.sold = sold;
        }

        self.store
            .update_listing(&listing)
            .await?
            .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))
    }

    /// Offers visible to `viewer`: the owner sees every offer, any other
    /// signed-in user sees their own, and anonymous callers see none.
    pub async fn offers(&self, listing_id: Uuid, viewer: Option<Uuid>) -> ApiResult<Vec<Offer>> {
        let listing = self.find(listing_id).await?;

        let Some(viewer) = viewer else {
            return Ok(Vec::new());
        };

        let mut offers = self.store.list_offers(listing_id).await?;
        if listing.owner_id != viewer {
            offers.retain(|o| o.user_id == viewer);
        }
        Ok(offers)
    }

    pub async fn make_offer(
        &self,
        listing_id: Uuid,
        bidder: Uuid,
        request: CreateOfferRequest,
    ) -> ApiResult<Offer> {
        let listing = self.find(listing_id).await?;

        if listing.owner_id == bidder {
            return Err(ApiError::BadRequest(
                "You cannot make an offer on your own listing".to_string(),
            ));
        }
        if listing.sold {
            return Err(ApiError::BadRequest(
                "This listing has already been sold".to_string(),
            ));
        }

        let price_cents = request
            .price
            .ok_or_else(|| ApiError::BadRequest("Price not given.".to_string()))?
            .to_cents()
            .map_err(ApiError::BadRequest)?;

        let offer = self
            .store
            .insert_offer(NewOffer {
                listing_id,
                user_id: bidder,
                price_cents,
            })
            .await?;

        tracing::info!(listing_id = %listing_id, offer_id = %offer.id, "Offer placed");
        Ok(offer)
    }
}

fn annotate(listings: Vec<Listing>, viewer: Uuid) -> Vec<ListingView> {
    listings
        .into_iter()
        .map(|l| ListingView::for_viewer(l, viewer))
        .collect()
}
