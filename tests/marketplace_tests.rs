//! Listings, offers, questions, messages and flags over HTTP

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::TestApp;

#[tokio::test]
async fn test_listing_routes_require_token() {
    let app = TestApp::new();

    let (status, body) = app.get("/listings", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["successful"], false);

    let (status, _) = app
        .post("/listings", Some("not-a-token"), json!({ "title": "Desk", "price": 10 }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_is_marked_for_its_owner() {
    let app = TestApp::new();
    let seller = app.signup("seller").await;
    let buyer = app.signup("buyer").await;
    let listing_id = app.create_listing(&seller, "Desk lamp", json!("$19.99")).await;

    let (status, body) = app
        .get(&format!("/listings/{}", listing_id), Some(&seller.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["priceCents"], 1999);
    assert_eq!(body["isOwner"], true);

    let (_, body) = app
        .get(&format!("/listings/{}", listing_id), Some(&buyer.token))
        .await;
    assert_eq!(body["isOwner"], false);

    let (_, body) = app
        .get(&format!("/listings/users/{}", seller.id), Some(&buyer.token))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_owner_edits_listing() {
    let app = TestApp::new();
    let seller = app.signup("editor").await;
    let other = app.signup("intruder").await;
    let listing_id = app.create_listing(&seller, "Bike", json!(120)).await;
    let uri = format!("/listings/{}", listing_id);

    let (status, _) = app.put(&uri, Some(&other.token), json!({ "sold": true })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&uri, Some(&seller.token), json!({ "title": "Road bike", "sold": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Road bike");
    assert_eq!(body["sold"], true);
}

#[tokio::test]
async fn test_unknown_listing_is_not_found() {
    let app = TestApp::new();
    let user = app.signup("lost").await;

    let (status, body) = app
        .get(&format!("/listings/{}", Uuid::new_v4()), Some(&user.token))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["text"], "Listing not found");
}

#[tokio::test]
async fn test_offer_visibility_depends_on_viewer() {
    let app = TestApp::new();
    let seller = app.signup("owner").await;
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let listing_id = app.create_listing(&seller, "Textbook", json!(50)).await;
    let uri = format!("/listings/{}/offers", listing_id);

    let (status, _) = app.post(&uri, Some(&alice.token), json!({ "price": 40 })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post(&uri, Some(&bob.token), json!({ "price": "45.50" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get(&uri, Some(&seller.token)).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = app.get(&uri, Some(&bob.token)).await;
    let offers = body.as_array().unwrap();
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0]["priceCents"], 4550);

    // The soft gate lets anonymous callers through with nothing to see
    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = app.get(&uri, Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_offer_rules() {
    let app = TestApp::new();
    let seller = app.signup("rules").await;
    let buyer = app.signup("bidder").await;
    let listing_id = app.create_listing(&seller, "Chair", json!(15)).await;
    let uri = format!("/listings/{}/offers", listing_id);

    let (status, _) = app.post(&uri, None, json!({ "price": 10 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post(&uri, Some(&seller.token), json!({ "price": 10 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(&uri, Some(&buyer.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["text"], "Price not given.");

    app.put(
        &format!("/listings/{}", listing_id),
        Some(&seller.token),
        json!({ "sold": true }),
    )
    .await;
    let (status, _) = app.post(&uri, Some(&buyer.token), json!({ "price": 10 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_only_owner_answers_questions() {
    let app = TestApp::new();
    let seller = app.signup("answerer").await;
    let asker = app.signup("asker").await;
    let listing_id = app.create_listing(&seller, "Monitor", json!(80)).await;

    let (status, body) = app
        .post(
            &format!("/listings/{}/questions", listing_id),
            Some(&asker.token),
            json!({ "question": "Any dead pixels?" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let question_id = body["question"]["id"].as_str().unwrap().to_string();
    let answer_uri = format!("/questions/{}/answer", question_id);

    let (status, _) = app.put(&answer_uri, None, json!({ "answer": "No" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .put(&answer_uri, Some(&asker.token), json!({ "answer": "No" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(&answer_uri, Some(&seller.token), json!({ "answer": "None at all" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "None at all");

    let (_, body) = app
        .get(&format!("/listings/{}/questions", listing_id), Some(&asker.token))
        .await;
    assert_eq!(body[0]["answer"], "None at all");
}

#[tokio::test]
async fn test_message_gates_report_first_failure() {
    let app = TestApp::new();
    let seller = app.signup("gateseller").await;
    let buyer = app.signup("gatebuyer").await;
    let listing_id = app.create_listing(&seller, "Lamp", json!(5)).await;

    let cases = [
        (json!({}), "Listing not given."),
        (json!({ "listing": Uuid::new_v4() }), "Could not find listing."),
        (json!({ "listing": "not-a-uuid" }), "Could not find listing."),
        (json!({ "listing": listing_id }), "Receiving user not given."),
        (
            json!({ "listing": listing_id, "receivingUser": Uuid::new_v4() }),
            "Could not find receiving user.",
        ),
        (
            json!({ "listing": listing_id, "receivingUser": seller.id }),
            "No message given.",
        ),
        (
            json!({ "listing": listing_id, "receivingUser": seller.id, "message": "" }),
            "No message given.",
        ),
    ];

    for (body, expected) in cases {
        let (status, response) = app.post("/messages", Some(&buyer.token), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["successful"], false);
        assert_eq!(response["text"], expected);
    }

    let (status, _) = app
        .post("/messages", None, json!({ "listing": listing_id }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_message_thread_in_order() {
    let app = TestApp::new();
    let seller = app.signup("threadseller").await;
    let buyer = app.signup("threadbuyer").await;
    let bystander = app.signup("bystander").await;
    let listing_id = app.create_listing(&seller, "Couch", json!(100)).await;

    for (from, to, text) in [
        (&buyer, &seller, "Is it available?"),
        (&seller, &buyer, "Yes"),
        (&buyer, &seller, "Great"),
    ] {
        let (status, body) = app
            .post(
                "/messages",
                Some(&from.token),
                json!({ "listing": listing_id, "receivingUser": to.id, "message": text }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["text"], "Message Successfully Created");
    }

    let uri = format!("/messages/{}/{}/{}", listing_id, seller.id, buyer.id);
    let (status, body) = app.get(&uri, Some(&buyer.token)).await;
    assert_eq!(status, StatusCode::OK);

    let texts: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["message"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["Is it available?", "Yes", "Great"]);
    assert_eq!(body[0]["sendingUser"]["email"], buyer.email.as_str());
    assert_eq!(body[0]["listing"]["title"], "Couch");

    let (status, _) = app.get(&uri, Some(&bystander.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .get(&format!("/messages/{}/users", listing_id), Some(&seller.token))
        .await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], buyer.id.to_string());
}

#[tokio::test]
async fn test_flag_listing() {
    let app = TestApp::new();
    let seller = app.signup("flagged").await;
    let reporter = app.signup("reporter").await;
    let listing_id = app.create_listing(&seller, "Suspicious", json!(1)).await;

    let (status, body) = app
        .post(
            "/flags",
            Some(&reporter.token),
            json!({ "listing": listing_id, "description": "Looks like a scam" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["flag"]["userId"], reporter.id.to_string());

    let (status, body) = app
        .post("/flags", Some(&reporter.token), json!({ "listing": Uuid::new_v4() }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["text"], "Could not find listing.");

    assert_eq!(app.store.flag_count().await, 1);
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
