//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AccountService, TokenCodec};
use crate::config::Config;
use crate::db::Store;
use crate::services::{FlagService, ListingService, MessageService, QuestionService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub token_codec: TokenCodec,
    pub account_service: Arc<AccountService>,
    pub listing_service: Arc<ListingService>,
    pub question_service: Arc<QuestionService>,
    pub message_service: Arc<MessageService>,
    pub flag_service: Arc<FlagService>,
}

impl AppState {
    /// Wire every service over one store, with token and account settings from `config`
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let token_codec = TokenCodec::new(
            &config.jwt_secret,
            chrono::Duration::seconds(config.jwt_ttl_seconds),
        );

        let account_service = AccountService::new(
            store.clone(),
            token_codec.clone(),
            config.account_policy.clone(),
        );
        let listing_service = ListingService::new(store.clone());
        let question_service = QuestionService::new(store.clone(), listing_service.clone());

        Self {
            token_codec,
            account_service: Arc::new(account_service),
            listing_service: Arc::new(listing_service),
            question_service: Arc::new(question_service),
            message_service: Arc::new(MessageService::new(store.clone())),
            flag_service: Arc::new(FlagService::new(store.clone())),
            store,
        }
    }
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.token_codec.clone()
    }
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.account_service.clone()
    }
}

impl FromRef<AppState> for Arc<ListingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.listing_service.clone()
    }
}

impl FromRef<AppState> for Arc<QuestionService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.question_service.clone()
    }
}

impl FromRef<AppState> for Arc<MessageService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.message_service.clone()
    }
}

impl FromRef<AppState> for Arc<FlagService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.flag_service.clone()
    }
}
