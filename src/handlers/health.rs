use axum::{extract::State, http::StatusCode, Json};

use crate::state::AppState;

/// Health check response
#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub database: String,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, status, database) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected".to_string()),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            format!("error: {}", e),
        ),
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            store: state.store.backend(),
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
