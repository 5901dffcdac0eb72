//! In-process store used by tests and by development runs without `DATABASE_URL`

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    Listing, ListingFlag, Message, NewListing, NewListingFlag, NewMessage, NewOffer, NewQuestion,
    NewUser, Offer, Question, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    users_by_email: HashMap<String, Uuid>,
    // Vecs keep insertion order, which breaks timestamp ties.
    listings: Vec<Listing>,
    offers: Vec<Offer>,
    questions: Vec<Question>,
    messages: Vec<Message>,
    flags: Vec<ListingFlag>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flags raised so far
    pub async fn flag_count(&self) -> usize {
        self.tables.read().await.flags.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        // Check and insert under one write lock.
        let mut tables = self.tables.write().await;
        if tables.users_by_email.contains_key(&user.email) {
            return Err(StoreError::Conflict(format!(
                "Email {} is already registered",
                user.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: Utc::now(),
        };
        tables.users_by_email.insert(user.email.clone(), user.id);
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert_listing(&self, listing: NewListing) -> Result<Listing, StoreError> {
        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4(),
            owner_id: listing.owner_id,
            title: listing.title,
            description: listing.description,
            price_cents: listing.price_cents,
            sold: false,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.listings.push(listing.clone());
        Ok(listing)
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.listings.iter().find(|l| l.id == id).cloned())
    }

    async fn update_listing(&self, listing: &Listing) -> Result<Option<Listing>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.listings.iter_mut().find(|l| l.id == listing.id) else {
            return Ok(None);
        };

        stored.title = listing.title.clone();
        stored.description = listing.description.clone();
        stored.price_cents = listing.price_cents;
        stored.sold = listing.sold;
        stored.updated_at = Utc::now();

        Ok(Some(stored.clone()))
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let tables = self.tables.read().await;
        let mut listings: Vec<Listing> = tables.listings.iter().rev().cloned().collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn list_listings_by_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let mut listings = self.list_listings().await?;
        listings.retain(|l| l.owner_id == owner_id);
        Ok(listings)
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, StoreError> {
        let offer = Offer {
            id: Uuid::new_v4(),
            listing_id: offer.listing_id,
            user_id: offer.user_id,
            price_cents: offer.price_cents,
            created_at: Utc::now(),
        };
        self.tables.write().await.offers.push(offer.clone());
        Ok(offer)
    }

    async fn list_offers(&self, listing_id: Uuid) -> Result<Vec<Offer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .offers
            .iter()
            .filter(|o| o.listing_id == listing_id)
            .cloned()
            .collect())
    }

    async fn insert_question(&self, question: NewQuestion) -> Result<Question, StoreError> {
        let question = Question {
            id: Uuid::new_v4(),
            listing_id: question.listing_id,
            asker_id: question.asker_id,
            question: question.question,
            answer: None,
            created_at: Utc::now(),
            answered_at: None,
        };
        self.tables.write().await.questions.push(question.clone());
        Ok(question)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_questions(&self, listing_id: Uuid) -> Result<Vec<Question>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .questions
            .iter()
            .filter(|q| q.listing_id == listing_id)
            .cloned()
            .collect())
    }

    async fn answer_question(
        &self,
        id: Uuid,
        answer: &str,
    ) -> Result<Option<Question>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(question) = tables.questions.iter_mut().find(|q| q.id == id) else {
            return Ok(None);
        };

        question.answer = Some(answer.to_string());
        question.answered_at = Some(Utc::now());

        Ok(Some(question.clone()))
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::new_v4(),
            listing_id: message.listing_id,
            sending_user: message.sending_user,
            receiving_user: message.receiving_user,
            message: message.message,
            created_at: Utc::now(),
        };
        self.tables.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn find_thread(
        &self,
        listing_id: Uuid,
        first: Uuid,
        second: Uuid,
    ) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read().await;
        let mut thread: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.listing_id == listing_id)
            .filter(|m| in_thread(m, first, second))
            .cloned()
            .collect();
        thread.sort_by_key(|m| m.created_at);
        Ok(thread)
    }

    async fn find_messages_for_user(
        &self,
        listing_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.listing_id == listing_id)
            .filter(|m| m.sending_user == user_id || m.receiving_user == user_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn insert_flag(&self, flag: NewListingFlag) -> Result<ListingFlag, StoreError> {
        let flag = ListingFlag {
            id: Uuid::new_v4(),
            description: flag.description,
            user_id: flag.user_id,
            listing_id: flag.listing_id,
            created_at: Utc::now(),
        };
        self.tables.write().await.flags.push(flag.clone());
        Ok(flag)
    }
}

/// Both ends are `first` or `second`, and `first` is one of them. Notes a
/// user sent to themselves on the listing belong to their side.
fn in_thread(message: &Message, first: Uuid, second: Uuid) -> bool {
    let party = |id: Uuid| id == first || id == second;
    party(message.sending_user)
        && party(message.receiving_user)
        && (message.sending_user == first || message.receiving_user == first)
}
