//! Route definitions for the Campus Market API

mod auth;
mod flag;
mod listing;
mod message;
mod question;

pub use auth::auth_routes;
pub use flag::flag_routes;
pub use listing::listing_routes;
pub use message::message_routes;
pub use question::question_routes;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::handlers::health::health_check;
use crate::middleware::{self, RateLimiter};
use crate::state::AppState;

/// All routes with state applied, without the outer middleware stack
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(listing_routes())
        .merge(question_routes())
        .merge(message_routes())
        .merge(flag_routes())
        .with_state(state)
}

/// The full application: routes plus tracing, security headers, rate
/// limiting and CORS.
///
/// Must be called from within a Tokio runtime; the rate limiter's idle
/// bucket sweep is spawned here.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let rate_limiter =
        RateLimiter::new(config.rate_limit_rps).trust_proxy_headers(config.trust_proxy_headers);
    rate_limiter.spawn_cleanup(middleware::CLEANUP_INTERVAL, middleware::BUCKET_IDLE_TIMEOUT);

    let mut app = api_router(state)
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit,
        ))
        .layer(axum::middleware::from_fn(middleware::request_tracing));

    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    app.layer(configure_cors(config.cors_allowed_origins.as_deref()))
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
