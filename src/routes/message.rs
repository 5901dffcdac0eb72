//! Message routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::message;
use crate::state::AppState;

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", post(message::create_message))
        .route(
            "/messages/:listing_id/users",
            get(message::find_users_in_message_thread),
        )
        .route(
            "/messages/:listing_id/:first_user_id/:second_user_id",
            get(message::find_messages),
        )
}
