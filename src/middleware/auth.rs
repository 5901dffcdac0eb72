//! Authentication middleware
//!
//! Two gates read the token from the `authorization` header:
//!
//! - [`authenticate_token`] is the hard gate. No token, or a token that does
//!   not verify, rejects the request with 401 before any handler logic runs.
//! - [`get_user_from_token`] is the soft gate. It attaches an identity when
//!   a valid token is present and otherwise lets the request through
//!   anonymously.
//!
//! Handlers use them through the [`AuthenticatedUser`] and [`OptionalUser`]
//! extractors.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::{AuthenticatedIdentity, JwtError, TokenCodec};
use crate::error::ApiError;

/// Why the hard gate refused a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("No token provided.")]
    MissingToken,

    #[error("Invalid token.")]
    InvalidToken(#[source] JwtError),
}

/// Pull the token out of the `authorization` header.
///
/// Accepts the bare token as well as `Bearer <token>`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Hard gate: identity or rejection
pub fn authenticate_token(
    headers: &HeaderMap,
    codec: &TokenCodec,
) -> Result<AuthenticatedIdentity, AuthFailure> {
    let token = token_from_headers(headers).ok_or(AuthFailure::MissingToken)?;
    codec.verify(token).map_err(AuthFailure::InvalidToken)
}

/// Soft gate: identity if one can be established, never a rejection
pub fn get_user_from_token(
    headers: &HeaderMap,
    codec: &TokenCodec,
) -> Option<AuthenticatedIdentity> {
    authenticate_token(headers, codec).ok()
}

/// Extractor for authenticated users
///
/// ```rust,ignore
/// async fn protected_handler(AuthenticatedUser(identity): AuthenticatedUser) -> String {
///     format!("Hello, {}", identity.first_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AuthenticatedIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    TokenCodec: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenCodec::from_ref(state);

        authenticate_token(&parts.headers, &codec)
            .map(AuthenticatedUser)
            .map_err(|failure| {
                if let AuthFailure::InvalidToken(ref e) = failure {
                    tracing::debug!(error = %e, path = %parts.uri.path(), "Rejected token");
                }
                ApiError::Unauthorized(failure.to_string()).into_response()
            })
    }
}

/// Optional authenticated user extractor
///
/// Attempts to authenticate but never fails the request.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedIdentity>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    TokenCodec: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenCodec::from_ref(state);
        Ok(OptionalUser(get_user_from_token(&parts.headers, &codec)))
    }
}
