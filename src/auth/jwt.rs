//! JWT token generation and validation
//!
//! Tokens are HS256 JWTs carrying the user id and display claims. They are
//! never stored: a token is valid iff its signature matches and the current
//! time is strictly before `exp`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::models::User;

/// JWT-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),
}

/// JWT claims as they appear on the wire
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Profile data carried alongside the user id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for IdentityClaims {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Identity attached to a request after its token verified.
///
/// Lives only for the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<Claims> for AuthenticatedIdentity {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| JwtError::InvalidClaims(format!("sub: {}", e)))?;
        let issued_at = timestamp(claims.iat, "iat")?;
        let expires_at = timestamp(claims.exp, "exp")?;

        Ok(Self {
            user_id,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            issued_at,
            expires_at,
        })
    }
}

fn timestamp(secs: i64, field: &str) -> Result<DateTime<Utc>, JwtError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| JwtError::InvalidClaims(format!("{} out of range", field)))
}

/// Signs and verifies identity tokens with a single shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            default_ttl,
        }
    }

    /// Issue a token for `user` with the configured TTL
    pub fn issue_for(&self, user: &User) -> Result<String, JwtError> {
        self.issue(user.id, IdentityClaims::from(user), self.default_ttl)
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        claims: IdentityClaims,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        self.issue_at(user_id, claims, ttl, Utc::now())
    }

    /// Issue a token as if the clock read `now`. Same inputs, same token.
    pub fn issue_at(
        &self,
        user_id: Uuid,
        claims: IdentityClaims,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| JwtError::EncodingFailed("token lifetime out of range".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token against the clock reading `now`
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedIdentity, JwtError> {
        // Expiry is checked below against `now` with zero leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    ErrorKind::MissingRequiredClaim(claim) => {
                        JwtError::InvalidClaims(format!("missing {}", claim))
                    }
                    _ => JwtError::Malformed(e.to_string()),
                }
            })?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(JwtError::TokenExpired);
        }

        AuthenticatedIdentity::try_from(token_data.claims)
    }
}
