//! Account HTTP handlers
//!
//! `create-account` and `login` answer with the `{ successful, text }`
//! envelope. `verify` answers with a bare JSON boolean, which existing
//! clients depend on.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::auth::{AccountService, TokenCodec};
use crate::error::ApiError;
use crate::middleware::authenticate_token;
use crate::models::{CreateAccountRequest, LoginRequest, MessageResponse};

/// POST /create-account
///
/// Business failures (missing field, wrong domain, short password, taken
/// email) are reported as 200 with `successful: false`.
pub async fn create_account(
    State(service): State<Arc<AccountService>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    match service.create_account(req).await {
        Ok(_) => Ok(Json(MessageResponse::success(
            "Account successfully created.",
        ))),
        Err(e) if e.is_business_failure() => {
            tracing::debug!(reason = %e, "Account creation refused");
            Ok(Json(MessageResponse::failure(e.to_string())))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /login
pub async fn login(
    State(service): State<Arc<AccountService>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let success = service.login(req).await?;

    Ok(Json(
        MessageResponse::success("Successfully logged in.").with_token(success.token),
    ))
}

/// GET /verify
pub async fn verify(
    State(codec): State<TokenCodec>,
    headers: HeaderMap,
) -> (StatusCode, Json<bool>) {
    match authenticate_token(&headers, &codec) {
        Ok(_) => (StatusCode::OK, Json(true)),
        Err(failure) => {
            tracing::debug!(reason = %failure, "Token verification failed");
            (StatusCode::UNAUTHORIZED, Json(false))
        }
    }
}
