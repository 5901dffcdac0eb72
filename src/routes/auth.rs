//! Account routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/create-account", post(auth::create_account))
        .route("/login", post(auth::login))
        .route("/verify", get(auth::verify))
}
