//! Account request DTOs
//!
//! Every field is optional so that a missing value reaches the account
//! service and becomes a business failure rather than a 422 from the
//! JSON extractor.

use serde::Deserialize;

/// Body of `POST /create-account`
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Body of `POST /login`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
