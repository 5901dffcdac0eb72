//! Persistence for Campus Market
//!
//! Handlers and services talk to a [`Store`]; [`PgStore`] backs it with
//! PostgreSQL and [`MemoryStore`] keeps everything in-process for tests
//! and local development.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{
    Listing, ListingFlag, Message, NewListing, NewListingFlag, NewMessage, NewOffer, NewQuestion,
    NewUser, Offer, Question, User,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Database connection error
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database: {0}")]
    ConnectionError(String),

    #[error("Failed to run migrations: {0}")]
    MigrationError(String),
}

/// Errors surfaced by a [`Store`]
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Database(String),
}

/// Document-style persistence used by the services.
///
/// Writes that must not race (such as "create user if the email is free")
/// are single calls so the backend can make them atomic.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a user; fails with [`StoreError::Conflict`] if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn insert_listing(&self, listing: NewListing) -> Result<Listing, StoreError>;
    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;
    /// Persist editable fields of `listing`; `None` if it no longer exists.
    async fn update_listing(&self, listing: &Listing) -> Result<Option<Listing>, StoreError>;
    /// All listings, newest first
    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError>;
    async fn list_listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError>;

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, StoreError>;
    /// Offers on a listing, oldest first
    async fn list_offers(&self, listing_id: Uuid) -> Result<Vec<Offer>, StoreError>;

    async fn insert_question(&self, question: NewQuestion) -> Result<Question, StoreError>;
    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, StoreError>;
    async fn list_questions(&self, listing_id: Uuid) -> Result<Vec<Question>, StoreError>;
    async fn answer_question(&self, id: Uuid, answer: &str)
        -> Result<Option<Question>, StoreError>;

    async fn insert_message(&self, message: NewMessage) -> Result<Message, StoreError>;
    /// Messages on a listing exchanged between `first` and `second`, oldest first
    async fn find_thread(
        &self,
        listing_id: Uuid,
        first: Uuid,
        second: Uuid,
    ) -> Result<Vec<Message>, StoreError>;
    /// Messages on a listing sent or received by `user_id`, oldest first
    async fn find_messages_for_user(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Message>, StoreError>;

    async fn insert_flag(&self, flag: NewListingFlag) -> Result<ListingFlag, StoreError>;
}

/// Create a database connection pool
pub async fn create_pool(config: &Config, database_url: &str) -> Result<PgPool, DbError> {
    tracing::info!(
        "Connecting to database at {}",
        config.database_url_masked().unwrap_or_default()
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect(database_url)
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

    tracing::info!("Database connection pool created successfully");

    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationError(e.to_string()))?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}
