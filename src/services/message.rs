//! Messages between users about a listing
//!
//! Creating a message runs an ordered chain of gates over a draft. Each
//! gate either returns the draft, possibly with more filled in, or fails
//! and stops the chain.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthenticatedIdentity;
use crate::db::Store;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateMessageRequest, Listing, ListingSummary, Message, MessageView, NewMessage, User,
    UserResponse,
};

/// A message being assembled by the gate chain
#[derive(Debug, Default)]
struct MessageDraft {
    request: CreateMessageRequest,
    listing: Option<Listing>,
    sending_user: Option<Uuid>,
    receiving_user: Option<User>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn Store>,
}

impl MessageService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        sender: &AuthenticatedIdentity,
        request: CreateMessageRequest,
    ) -> ApiResult<Message> {
        let draft = MessageDraft {
            request,
            ..MessageDraft::default()
        };

        let draft = self.validate_listing(draft).await?;
        let draft = set_sending_user(draft, sender);
        let draft = self.validate_receiver(draft).await?;
        let draft = validate_message(draft)?;

        let new_message = match draft {
            MessageDraft {
                listing: Some(listing),
                sending_user: Some(sending_user),
                receiving_user: Some(receiver),
                message: Some(message),
                ..
            } => NewMessage {
                listing_id: listing.id,
                sending_user,
                receiving_user: receiver.id,
                message,
            },
            _ => {
                return Err(ApiError::InternalError(
                    "Message draft incomplete after validation".to_string(),
                ))
            }
        };

        let message = self.store.insert_message(new_message).await?;
        tracing::info!(
            message_id = %message.id,
            listing_id = %message.listing_id,
            "Message sent"
        );
        Ok(message)
    }

    async fn validate_listing(&self, mut draft: MessageDraft) -> ApiResult<MessageDraft> {
        let raw = non_empty(draft.request.listing.as_deref())
            .ok_or_else(|| ApiError::BadRequest("Listing not given.".to_string()))?;

        let listing = match Uuid::parse_str(raw) {
            Ok(id) => self.store.find_listing(id).await?,
            Err(_) => None,
        };

        draft.listing =
            Some(listing.ok_or_else(|| ApiError::BadRequest("Could not find listing.".to_string()))?);
        Ok(draft)
    }

    async fn validate_receiver(&self, mut draft: MessageDraft) -> ApiResult<MessageDraft> {
        let raw = non_empty(draft.request.receiving_user.as_deref())
            .ok_or_else(|| ApiError::BadRequest("Receiving user not given.".to_string()))?;

        let receiver = match Uuid::parse_str(raw) {
            Ok(id) => self.store.find_user_by_id(id).await?,
            Err(_) => None,
        };

        draft.receiving_user = Some(receiver.ok_or_else(|| {
            ApiError::BadRequest("Could not find receiving user.".to_string())
        })?);
        Ok(draft)
    }

    /// Both sides of the conversation between `first` and `second` on a
    /// listing, oldest first, with users and listing filled in.
    pub async fn thread(
        &self,
        viewer: Uuid,
        listing_id: Uuid,
        first: Uuid,
        second: Uuid,
    ) -> ApiResult<Vec<MessageView>> {
        if viewer != first && viewer != second {
            return Err(ApiError::Forbidden(
                "You can only read conversations you are part of".to_string(),
            ));
        }

        let listing = self.find_listing(listing_id).await?;
        let messages = self.store.find_thread(listing_id, first, second).await?;
        let users = self
            .load_users(messages.iter().flat_map(|m| [m.sending_user, m.receiving_user]))
            .await?;

        let summary = ListingSummary {
            id: listing.id,
            title: listing.title,
        };

        messages
            .into_iter()
            .map(|m| {
                Ok(MessageView {
                    id: m.id,
                    listing: summary.clone(),
                    sending_user: lookup(&users, m.sending_user)?,
                    receiving_user: lookup(&users, m.receiving_user)?,
                    message: m.message,
                    created_at: m.created_at,
                })
            })
            .collect()
    }

    /// Everyone `viewer` has exchanged messages with on a listing, in order
    /// of first contact.
    pub async fn thread_participants(
        &self,
        viewer: Uuid,
        listing_id: Uuid,
    ) -> ApiResult<Vec<UserResponse>> {
        self.find_listing(listing_id).await?;
        let messages = self.store.find_messages_for_user(listing_id, viewer).await?;

        let mut counterparts: Vec<Uuid> = Vec::new();
        for m in &messages {
            let other = if m.sending_user == viewer {
                m.receiving_user
            } else {
                m.sending_user
            };
            if other != viewer && !counterparts.contains(&other) {
                counterparts.push(other);
            }
        }

        let users = self.load_users(counterparts.iter().copied()).await?;
        counterparts
            .into_iter()
            .map(|id| lookup(&users, id))
            .collect()
    }

    async fn find_listing(&self, id: Uuid) -> ApiResult<Listing> {
        self.store
            .find_listing(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Listing not found".to_string()))
    }

    async fn load_users(
        &self,
        ids: impl Iterator<Item = Uuid>,
    ) -> ApiResult<HashMap<Uuid, UserResponse>> {
        let mut users = HashMap::new();
        for id in ids {
            if users.contains_key(&id) {
                continue;
            }
            if let Some(user) = self.store.find_user_by_id(id).await? {
                users.insert(id, UserResponse::from(user));
            }
        }
        Ok(users)
    }
}

fn set_sending_user(mut draft: MessageDraft, sender: &AuthenticatedIdentity) -> MessageDraft {
    draft.sending_user = Some(sender.user_id);
    draft
}

fn validate_message(mut draft: MessageDraft) -> ApiResult<MessageDraft> {
    let text = draft
        .request
        .message
        .take()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No message given.".to_string()))?;

    draft.message = Some(text);
    Ok(draft)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn lookup(users: &HashMap<Uuid, UserResponse>, id: Uuid) -> ApiResult<UserResponse> {
    users
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::InternalError(format!("User {} referenced by a message is missing", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewListing, NewUser};
    use chrono::Utc;

    struct Fixture {
        service: MessageService,
        alice: User,
        bob: User,
        listing: Listing,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let mut users = Vec::new();
        for name in ["alice", "bob"] {
            users.push(
                store
                    .insert_user(NewUser {
                        email: format!("{}@gatech.edu", name),
                        password_hash: "hash".to_string(),
                        first_name: name.to_string(),
                        last_name: "Jacket".to_string(),
                    })
                    .await
                    .unwrap(),
            );
        }
        let bob = users.pop().unwrap();
        let alice = users.pop().unwrap();

        let listing = store
            .insert_listing(NewListing {
                owner_id: bob.id,
                title: "Calculus textbook".to_string(),
                description: String::new(),
                price_cents: 4000,
            })
            .await
            .unwrap();

        Fixture {
            service: MessageService::new(store),
            alice,
            bob,
            listing,
        }
    }

    fn identity(user: &User) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user_id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
        }
    }

    fn request(listing: Option<String>, to: Option<String>, text: Option<&str>) -> CreateMessageRequest {
        CreateMessageRequest {
            listing,
            receiving_user: to,
            message: text.map(str::to_string),
        }
    }

    async fn rejection(f: &Fixture, req: CreateMessageRequest) -> String {
        match f.service.create(&identity(&f.alice), req).await {
            Err(ApiError::BadRequest(text)) => text,
            other => panic!("expected BadRequest, got {:?}", other.map(|m| m.id)),
        }
    }

    #[tokio::test]
    async fn test_gates_run_in_order() {
        let f = fixture().await;
        let listing = Some(f.listing.id.to_string());
        let bob = Some(f.bob.id.to_string());

        assert_eq!(
            rejection(&f, request(None, None, None)).await,
            "Listing not given."
        );
        assert_eq!(
            rejection(&f, request(Some("nope".to_string()), bob.clone(), Some("hi"))).await,
            "Could not find listing."
        );
        assert_eq!(
            rejection(&f, request(listing.clone(), None, Some("hi"))).await,
            "Receiving user not given."
        );
        assert_eq!(
            rejection(&f, request(listing.clone(), Some(Uuid::new_v4().to_string()), Some("hi"))).await,
            "Could not find receiving user."
        );
        assert_eq!(
            rejection(&f, request(listing, bob, Some("   "))).await,
            "No message given."
        );
    }

    #[tokio::test]
    async fn test_sender_comes_from_identity() {
        let f = fixture().await;
        let message = f
            .service
            .create(
                &identity(&f.alice),
                request(
                    Some(f.listing.id.to_string()),
                    Some(f.bob.id.to_string()),
                    Some("Is this still available?"),
                ),
            )
            .await
            .unwrap();

        assert_eq!(message.sending_user, f.alice.id);
        assert_eq!(message.receiving_user, f.bob.id);

        let participants = f
            .service
            .thread_participants(f.bob.id, f.listing.id)
            .await
            .unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].id, f.alice.id);
    }

    #[tokio::test]
    async fn test_outsider_cannot_read_thread() {
        let f = fixture().await;
        let err = f
            .service
            .thread(Uuid::new_v4(), f.listing.id, f.alice.id, f.bob.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
