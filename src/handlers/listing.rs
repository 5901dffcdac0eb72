//! Listing and offer handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{AuthenticatedUser, OptionalUser};
use crate::models::{
    CreateListingRequest, CreateOfferRequest, CreatedResponse, Listing, ListingView, Offer,
    UpdateListingRequest,
};
use crate::services::ListingService;

#[derive(Debug, serde::Serialize)]
pub struct ListingBody {
    pub listing: Listing,
}

#[derive(Debug, serde::Serialize)]
pub struct OfferBody {
    pub offer: Offer,
}

/// GET /listings
pub async fn list_listings(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    Ok(Json(service.list(user.user_id).await?))
}

/// POST /listings
pub async fn create_listing(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<CreatedResponse<ListingBody>>), ApiError> {
    let listing = service.create(user.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            successful: true,
            text: "Listing Successfully Created".to_string(),
            data: ListingBody { listing },
        }),
    ))
}

/// GET /listings/:id
pub async fn get_listing(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ListingView>, ApiError> {
    Ok(Json(service.get(id, user.user_id).await?))
}

/// PUT /listings/:id
pub async fn edit_listing(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateListingRequest>,
) -> Result<Json<Listing>, ApiError> {
    Ok(Json(service.edit(id, user.user_id, request).await?))
}

/// GET /listings/users/:user_id
pub async fn listings_for_user(
    State(service): State<Arc<ListingService>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    Ok(Json(service.list_for_owner(owner_id, user.user_id).await?))
}

/// GET /listings/:id/offers
pub async fn get_offers(
    State(service): State<Arc<ListingService>>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Offer>>, ApiError> {
    let viewer = user.map(|u| u.user_id);
    Ok(Json(service.offers(id, viewer).await?))
}

/// POST /listings/:id/offers
pub async fn post_offer(
    State(service): State<Arc<ListingService>>,
    OptionalUser(user): OptionalUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<CreatedResponse<OfferBody>>), ApiError> {
    let user = user.ok_or_else(|| {
        ApiError::Unauthorized("You must be logged in to make an offer.".to_string())
    })?;

    let offer = service.make_offer(id, user.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            successful: true,
            text: "Offer Successfully Created".to_string(),
            data: OfferBody { offer },
        }),
    ))
}
