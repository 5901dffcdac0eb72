//! Middleware for the Campus Market API
//!
//! Request tracing, rate limiting, security headers, and the two
//! authentication gates.

pub mod auth;
mod rate_limiter;
mod security;
mod tracing;

pub use auth::{
    authenticate_token, get_user_from_token, token_from_headers, AuthFailure, AuthenticatedUser,
    OptionalUser,
};
pub use rate_limiter::{
    client_ip, peer_ip, rate_limit, RateLimiter, BUCKET_IDLE_TIMEOUT, CLEANUP_INTERVAL,
};
pub use security::{hsts_header, security_headers};
pub use self::tracing::request_tracing;
