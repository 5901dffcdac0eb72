use axum::{routing::post, Router};

use crate::handlers::flag;
use crate::state::AppState;

pub fn flag_routes() -> Router<AppState> {
    Router::new().route("/flags", post(flag::create_flag))
}
