//! Configuration management for Campus Market
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use std::env;
use thiserror::Error;

/// Secret used when `JWT_SECRET` is unset outside production.
const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

/// Longest accepted token lifetime: one year
pub const MAX_JWT_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Work factors bcrypt accepts
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Account rules applied at registration
#[derive(Debug, Clone)]
pub struct AccountPolicy {
    /// Email domain every account must belong to (without the `@`)
    pub allowed_email_domain: String,
    /// Minimum accepted password length, in characters
    pub min_password_length: usize,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            allowed_email_domain: "gatech.edu".to_string(),
            min_password_length: 8,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,

    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Maximum database connections
    pub db_max_connections: u32,

    /// Rate limit: requests per second per client
    pub rate_limit_rps: u32,

    /// Key rate limiting on `x-forwarded-for` rather than the peer address.
    /// Only safe behind a proxy that overwrites the header.
    pub trust_proxy_headers: bool,

    /// CORS allowed origins (comma separated)
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// JWT secret for token signing
    pub jwt_secret: String,

    /// Token TTL in seconds (default: 86400 = 1 day)
    pub jwt_ttl_seconds: i64,

    pub account_policy: AccountPolicy,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if database_url.is_none() && environment.is_production() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5);
        let rate_limit_rps = parse_or("RATE_LIMIT_RPS", 100);
        let trust_proxy_headers = parse_or("TRUST_PROXY_HEADERS", false);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::MissingEnvVar("JWT_SECRET".to_string()))
            }
            _ => DEV_JWT_SECRET.to_string(),
        };

        let jwt_ttl_seconds = check_jwt_ttl(parse_or("JWT_TTL_SECONDS", 86_400))?;

        let defaults = AccountPolicy::default();
        let account_policy = AccountPolicy {
            allowed_email_domain: env::var("ALLOWED_EMAIL_DOMAIN")
                .map(|d| d.trim_start_matches('@').to_lowercase())
                .unwrap_or(defaults.allowed_email_domain),
            min_password_length: parse_or("MIN_PASSWORD_LENGTH", defaults.min_password_length),
            bcrypt_cost: check_bcrypt_cost(parse_or("BCRYPT_COST", defaults.bcrypt_cost))?,
        };

        Ok(Config {
            database_url,
            environment,
            port,
            db_max_connections,
            rate_limit_rps,
            trust_proxy_headers,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            jwt_ttl_seconds,
            account_policy,
        })
    }

    /// Database URL with the password masked, for logging
    pub fn database_url_masked(&self) -> Option<String> {
        self.database_url.as_deref().map(mask_url_password)
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn check_jwt_ttl(seconds: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_JWT_TTL_SECONDS).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(ConfigError::InvalidValue(format!(
            "JWT_TTL_SECONDS must be between 1 and {}",
            MAX_JWT_TTL_SECONDS
        )))
    }
}

fn check_bcrypt_cost(cost: u32) -> Result<u32, ConfigError> {
    if BCRYPT_COST_RANGE.contains(&cost) {
        Ok(cost)
    } else {
        Err(ConfigError::InvalidValue(format!(
            "BCRYPT_COST must be between {} and {}",
            BCRYPT_COST_RANGE.start(),
            BCRYPT_COST_RANGE.end()
        )))
    }
}

fn mask_url_password(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // "postgresql://host" has its only colon in the scheme
            if !url[colon_pos..].starts_with("://") {
                return format!("{}****{}", &url[..colon_pos + 1], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}
