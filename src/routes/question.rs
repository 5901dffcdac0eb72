//! Question routes

use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::question;
use crate::state::AppState;

pub fn question_routes() -> Router<AppState> {
    Router::new()
        .route("/questions/:id", get(question::get_question))
        .route("/questions/:id/answer", put(question::put_answer))
}
