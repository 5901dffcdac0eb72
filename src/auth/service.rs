//! Account lifecycle: registration and login
//!
//! Registration validates the payload, hashes the password and performs a
//! single atomic insert. Login checks the stored hash and mints a token.

use std::sync::Arc;
use thiserror::Error;

use crate::config::AccountPolicy;
use crate::db::{Store, StoreError};
use crate::models::{CreateAccountRequest, LoginRequest, NewUser, User};

use super::jwt::{JwtError, TokenCodec};
use super::password::{hash_password, verify_password, PasswordError};

/// Account service errors
#[derive(Error, Debug)]
pub enum AccountError {
    /// A field is missing or breaks an account rule
    #[error("{0}")]
    Validation(String),

    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// Failures the API reports as `successful: false` rather than as a fault
    pub fn is_business_failure(&self) -> bool {
        matches!(self, AccountError::Validation(_) | AccountError::EmailTaken)
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => AccountError::EmailTaken,
            StoreError::Database(msg) => AccountError::Store(msg),
        }
    }
}

impl From<PasswordError> for AccountError {
    fn from(e: PasswordError) -> Self {
        AccountError::Internal(e.to_string())
    }
}

impl From<JwtError> for AccountError {
    fn from(e: JwtError) -> Self {
        AccountError::Internal(e.to_string())
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub user: User,
}

/// Registration and login service
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    codec: TokenCodec,
    policy: AccountPolicy,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, codec: TokenCodec, policy: AccountPolicy) -> Self {
        Self {
            store,
            codec,
            policy,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Validate and persist a new account
    pub async fn create_account(&self, req: CreateAccountRequest) -> Result<User, AccountError> {
        let email = required(req.email, "Email")?.to_lowercase();
        let password = req
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AccountError::Validation("Password is required.".to_string()))?;
        let first_name = required(req.first_name, "First name")?;
        let last_name = required(req.last_name, "Last name")?;

        self.check_email_domain(&email)?;

        if password.chars().count() < self.policy.min_password_length {
            return Err(AccountError::Validation(format!(
                "Password must be at least {} characters.",
                self.policy.min_password_length
            )));
        }

        let password_hash = hash_password(password, self.policy.bcrypt_cost).await?;

        // Uniqueness is left to the store so concurrent registrations cannot both win.
        let user = self
            .store
            .insert_user(NewUser {
                email,
                password_hash,
                first_name,
                last_name,
            })
            .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "Account created");

        Ok(user)
    }

    /// Check credentials and mint a token
    pub async fn login(&self, req: LoginRequest) -> Result<LoginSuccess, AccountError> {
        let email = req
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or(AccountError::InvalidCredentials)?;
        let password = req.password.ok_or(AccountError::InvalidCredentials)?;

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::debug!(email = %email, "Login for unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(password, user.password_hash.clone()).await? {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.codec.issue_for(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginSuccess { token, user })
    }

    fn check_email_domain(&self, email: &str) -> Result<(), AccountError> {
        let domain = &self.policy.allowed_email_domain;
        let valid = match email.split_once('@') {
            Some((local, host)) => !local.is_empty() && !host.contains('@') && host == domain,
            None => false,
        };

        if valid {
            Ok(())
        } else {
            Err(AccountError::Validation(format!(
                "Email must be a valid @{} address.",
                domain
            )))
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AccountError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AccountError::Validation(format!("{} is required.", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::Duration;

    fn service() -> AccountService {
        let policy = AccountPolicy {
            bcrypt_cost: 4,
            ..AccountPolicy::default()
        };
        AccountService::new(
            Arc::new(MemoryStore::new()),
            TokenCodec::new("test-secret", Duration::hours(1)),
            policy,
        )
    }

    fn request(email: &str, password: &str) -> CreateAccountRequest {
        CreateAccountRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            first_name: Some("George".to_string()),
            last_name: Some("Burdell".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_account_stores_hash_only() {
        let service = service();
        let user = service
            .create_account(request("GBurdell3@GATECH.edu", "burdell1885"))
            .await
            .unwrap();

        assert_eq!(user.email, "gburdell3@gatech.edu");
        assert_ne!(user.password_hash, "burdell1885");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn test_email_domain_rules() {
        let service = service();
        for email in ["jokogie@gmail.com", "@gatech.edu", "gatech.edu", "a@b@gatech.edu"] {
            let err = service
                .create_account(request(email, "burdell1885"))
                .await
                .unwrap_err();
            assert!(err.is_business_failure(), "{} should be rejected", email);
        }
    }

    #[tokio::test]
    async fn test_password_threshold() {
        let service = service();
        assert!(service
            .create_account(request("short@gatech.edu", "minimum"))
            .await
            .is_err());
        assert!(service
            .create_account(request("min@gatech.edu", "minimum1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_business_failure() {
        let service = service();
        service
            .create_account(request("dup@gatech.edu", "burdell1885"))
            .await
            .unwrap();

        let err = service
            .create_account(request("dup@gatech.edu", "imposter5"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));
        assert!(err.is_business_failure());
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let service = service();
        let user = service
            .create_account(request("login@gatech.edu", "burdell1885"))
            .await
            .unwrap();

        let success = service
            .login(LoginRequest {
                email: Some("login@gatech.edu".to_string()),
                password: Some("burdell1885".to_string()),
            })
            .await
            .unwrap();

        let identity = service.codec().verify(&success.token).unwrap();
        assert_eq!(identity.user_id, user.id);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let service = service();
        service
            .create_account(request("login@gatech.edu", "burdell1885"))
            .await
            .unwrap();

        for (email, password) in [
            ("nobody@gatech.edu", "burdell1885"),
            ("login@gatech.edu", "badpassword"),
        ] {
            let err = service
                .login(LoginRequest {
                    email: Some(email.to_string()),
                    password: Some(password.to_string()),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AccountError::InvalidCredentials));
        }
    }
}
