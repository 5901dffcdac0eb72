//! Shared harness for the HTTP integration tests.
//!
//! Builds the full application over a [`MemoryStore`] and drives it with
//! `tower::ServiceExt::oneshot`, so no socket or database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use campus_market_server::auth::TokenCodec;
use campus_market_server::config::{AccountPolicy, Config, Environment};
use campus_market_server::db::MemoryStore;
use campus_market_server::routes;
use campus_market_server::state::AppState;

pub const PASSWORD: &str = "correct-horse";

pub fn test_config() -> Config {
    Config {
        database_url: None,
        environment: Environment::Development,
        port: 0,
        db_max_connections: 1,
        rate_limit_rps: 10_000,
        trust_proxy_headers: false,
        cors_allowed_origins: None,
        log_level: "warn".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_ttl_seconds: 3600,
        account_policy: AccountPolicy {
            bcrypt_cost: 4,
            ..AccountPolicy::default()
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub codec: TokenCodec,
    pub store: MemoryStore,
}

/// A registered, logged-in user
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let store = MemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()), &config);
        let codec = state.token_codec.clone();

        Self {
            router: routes::build_app(state, &config),
            codec,
            store,
        }
    }

    /// Send one request and return the status plus the parsed JSON body
    /// (`Value::Null` for an empty body).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn create_account(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/create-account",
            None,
            json!({
                "email": email,
                "password": password,
                "firstName": "George",
                "lastName": "Burdell",
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.post("/login", None, json!({ "email": email, "password": password }))
            .await
    }

    /// Register `name@gatech.edu` and log in
    pub async fn signup(&self, name: &str) -> TestUser {
        let email = format!("{}@gatech.edu", name);
        let (_, body) = self.create_account(&email, PASSWORD).await;
        assert_eq!(body["successful"], true, "signup failed: {}", body);

        let (status, body) = self.login(&email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        let id = self.codec.verify(&token).unwrap().user_id;

        TestUser { id, email, token }
    }

    /// Create a listing owned by `owner`, returning its id
    pub async fn create_listing(&self, owner: &TestUser, title: &str, price: Value) -> Uuid {
        let (status, body) = self
            .post(
                "/listings",
                Some(&owner.token),
                json!({ "title": title, "description": "Barely used", "price": price }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "listing failed: {}", body);

        body["listing"]["id"].as_str().unwrap().parse().unwrap()
    }
}
