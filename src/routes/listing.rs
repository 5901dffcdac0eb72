//! Listing, offer and per-listing question routes

use axum::{routing::get, Router};

use crate::handlers::{listing, question};
use crate::state::AppState;

pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/listings",
            get(listing::list_listings).post(listing::create_listing),
        )
        .route(
            "/listings/:id",
            get(listing::get_listing).put(listing::edit_listing),
        )
        .route("/listings/users/:user_id", get(listing::listings_for_user))
        .route(
            "/listings/:id/offers",
            get(listing::get_offers).post(listing::post_offer),
        )
        .route(
            "/listings/:id/questions",
            get(question::list_questions).post(question::ask_question),
        )
}
