//! PostgreSQL-backed store

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    Listing, ListingFlag, Message, NewListing, NewListingFlag, NewMessage, NewOffer, NewQuestion,
    NewUser, Offer, Question, User,
};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        // The unique index on email makes this the only uniqueness check.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, email, password_hash, first_name, last_name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict(format!("Email {} is already registered", user.email))
            }
            other => other,
        })?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, first_name, last_name, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, first_name, last_name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(user)
    }

    async fn insert_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let now = Utc::now();
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings (id, owner_id, title, description, price_cents, sold, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(listing.owner_id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price_cents)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(listing)
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(listing)
    }

    async fn update_listing(&self, listing: &Listing) -> Result<Option<Listing>, StoreError> {
        let updated = sqlx::query_as::<_, Listing>(
            r#"
            UPDATE listings
            SET title = $2, description = $3, price_cents = $4, sold = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(listing.id)
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.price_cents)
        .bind(listing.sold)
        .bind(Utc::now())
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(updated)
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let listings =
            sqlx::query_as::<_, Listing>("SELECT * FROM listings ORDER BY created_at DESC")
                .fetch_all(&self.db_pool)
                .await?;

        Ok(listings)
    }

    async fn list_listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let listings = sqlx::query_as::<_, Listing>(
            "SELECT * FROM listings WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(listings)
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, StoreError> {
        let offer = sqlx::query_as::<_, Offer>(
            r#"
            INSERT INTO offers (id, listing_id, user_id, price_cents, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(offer.listing_id)
        .bind(offer.user_id)
        .bind(offer.price_cents)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(offer)
    }

    async fn list_offers(&self, listing_id: Uuid) -> Result<Vec<Offer>, StoreError> {
        let offers = sqlx::query_as::<_, Offer>(
            "SELECT * FROM offers WHERE listing_id = $1 ORDER BY created_at ASC",
        )
        .bind(listing_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(offers)
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question, StoreError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (id, listing_id, asker_id, question, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question.listing_id)
        .bind(question.asker_id)
        .bind(&question.question)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(question)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        let question = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(question)
    }

    async fn list_questions(&self, listing_id: Uuid) -> Result<Vec<Question>, StoreError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions WHERE listing_id = $1 ORDER BY created_at ASC",
        )
        .bind(listing_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(questions)
    }

    async fn answer_question(
        &self,
        id: Uuid,
        answer: &str,
    ) -> Result<Option<Question>, StoreError> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET answer = $2, answered_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(answer)
        .bind(Utc::now())
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(question)
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, listing_id, sending_user, receiving_user, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message.listing_id)
        .bind(message.sending_user)
        .bind(message.receiving_user)
        .bind(&message.message)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(message)
    }

    async fn find_thread(
        &self,
        listing_id: Uuid,
        first: Uuid,
        second: Uuid,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE listing_id = $1
              AND sending_user IN ($2, $3)
              AND receiving_user IN ($2, $3)
              AND (sending_user = $2 OR receiving_user = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(listing_id)
        .bind(first)
        .bind(second)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(messages)
    }

    async fn find_messages_for_user(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE listing_id = $1 AND (sending_user = $2 OR receiving_user = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(listing_id)
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(messages)
    }

    async fn insert_flag(&self, flag: NewListingFlag) -> Result<ListingFlag, StoreError> {
        let flag = sqlx::query_as::<_, ListingFlag>(
            r#"
            INSERT INTO listing_flags (id, description, user_id, listing_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&flag.description)
        .bind(flag.user_id)
        .bind(flag.listing_id)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(flag)
    }
}
