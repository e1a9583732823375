//! HTTP boundary tests: the full router over the in-memory store, driven
//! through tower's `oneshot` without binding a socket.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use ironbank::api::{AppState, build_router, error_codes};
use ironbank::db::{CreateAccountParams, LedgerStore, MemStore};
use ironbank::token::{JwtMaker, TokenMaker};

fn setup() -> (Router, Arc<AppState>) {
    let store = Arc::new(MemStore::new());
    let maker = JwtMaker::new(&"s".repeat(32)).unwrap();
    let state = Arc::new(AppState::new(
        store,
        Arc::new(maker),
        15,
        CancellationToken::new(),
    ));
    (build_router(state.clone()), state)
}

fn token_for(state: &AppState, username: &str) -> String {
    let (token, _) = state
        .token_maker
        .create_token(username, chrono::Duration::minutes(15))
        .unwrap();
    token
}

fn post(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_account(state: &AppState, owner: &str, currency: &str, balance: i64) -> i64 {
    state
        .store
        .create_account(CreateAccountParams {
            owner: owner.to_string(),
            currency: currency.to_string(),
            balance,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn create_user_never_exposes_the_password_hash() {
    let (router, _) = setup();

    let response = router
        .oneshot(post(
            "/users",
            json!({
                "username": "alice",
                "password": "long-enough-password",
                "full_name": "Alice Doe",
                "email": "alice@example.com",
            }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["code"], error_codes::SUCCESS);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("hashed_password").is_none());
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn login_issues_a_usable_token() {
    let (router, state) = setup();

    router
        .clone()
        .oneshot(post(
            "/users",
            json!({
                "username": "alice",
                "password": "long-enough-password",
                "full_name": "Alice Doe",
                "email": "alice@example.com",
            }),
            None,
        ))
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(post(
            "/users/login",
            json!({"username": "alice", "password": "long-enough-password"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["access_token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(
        state.token_maker.verify_token(token).unwrap().username,
        "alice"
    );

    // Wrong password.
    let response = router
        .oneshot(post(
            "/users/login",
            json!({"username": "alice", "password": "not-the-password"}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], error_codes::AUTH_FAILED);
}

#[tokio::test]
async fn private_routes_require_a_bearer_token() {
    let (router, _) = setup();

    let response = router.oneshot(get("/accounts/1", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], error_codes::MISSING_AUTH);
}

#[tokio::test]
async fn account_creation_and_ownership() {
    let (router, state) = setup();
    let alice = token_for(&state, "alice");
    let bob = token_for(&state, "bob");

    let response = router
        .clone()
        .oneshot(post("/accounts", json!({"currency": "USD"}), Some(&alice)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["owner"], "alice");
    assert_eq!(body["data"]["balance"], 0);
    let id = body["data"]["id"].as_i64().unwrap();

    // Unsupported currency.
    let response = router
        .clone()
        .oneshot(post("/accounts", json!({"currency": "JPY"}), Some(&alice)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Owner reads it back.
    let response = router
        .clone()
        .oneshot(get(&format!("/accounts/{id}"), Some(&alice)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A different user may not.
    let response = router
        .clone()
        .oneshot(get(&format!("/accounts/{id}"), Some(&bob)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], error_codes::NOT_OWNER);

    // Unknown id.
    let response = router
        .clone()
        .oneshot(get("/accounts/9999", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Listing shows only the caller's account.
    let response = router
        .oneshot(get("/accounts?page_id=1&page_size=5", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn transfer_endpoint_moves_funds() {
    let (router, state) = setup();
    let alice = token_for(&state, "alice");

    let from = seed_account(&state, "alice", "USD", 1000).await;
    let to = seed_account(&state, "bob", "USD", 1000).await;

    let response = router
        .clone()
        .oneshot(post(
            "/transfers",
            json!({
                "from_account_id": from,
                "to_account_id": to,
                "amount": 10,
                "currency": "USD",
            }),
            Some(&alice),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["transfer"]["amount"], 10);
    assert_eq!(body["data"]["from_account"]["balance"], 990);
    assert_eq!(body["data"]["to_account"]["balance"], 1010);
    assert_eq!(body["data"]["from_entry"]["amount"], -10);
    assert_eq!(body["data"]["to_entry"]["amount"], 10);

    assert_eq!(state.store.get_account(from).await.unwrap().balance, 990);
    assert_eq!(state.store.get_account(to).await.unwrap().balance, 1010);
}

#[tokio::test]
async fn transfer_currency_must_match_both_accounts() {
    let (router, state) = setup();
    let alice = token_for(&state, "alice");

    let from = seed_account(&state, "alice", "USD", 1000).await;
    let to = seed_account(&state, "bob", "EUR", 1000).await;

    let response = router
        .oneshot(post(
            "/transfers",
            json!({
                "from_account_id": from,
                "to_account_id": to,
                "amount": 10,
                "currency": "USD",
            }),
            Some(&alice),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], error_codes::CURRENCY_MISMATCH);

    // Nothing moved.
    assert_eq!(state.store.get_account(from).await.unwrap().balance, 1000);
    assert_eq!(state.store.get_account(to).await.unwrap().balance, 1000);
}

#[tokio::test]
async fn transfer_requires_owning_the_source_account() {
    let (router, state) = setup();
    let bob = token_for(&state, "bob");

    let from = seed_account(&state, "alice", "USD", 1000).await;
    let to = seed_account(&state, "bob", "USD", 1000).await;

    let response = router
        .oneshot(post(
            "/transfers",
            json!({
                "from_account_id": from,
                "to_account_id": to,
                "amount": 10,
                "currency": "USD",
            }),
            Some(&bob),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], error_codes::NOT_OWNER);
}

#[tokio::test]
async fn transfer_overdraft_is_rejected_atomically() {
    let (router, state) = setup();
    let alice = token_for(&state, "alice");

    let from = seed_account(&state, "alice", "USD", 50).await;
    let to = seed_account(&state, "bob", "USD", 1000).await;

    let response = router
        .oneshot(post(
            "/transfers",
            json!({
                "from_account_id": from,
                "to_account_id": to,
                "amount": 100,
                "currency": "USD",
            }),
            Some(&alice),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], error_codes::INSUFFICIENT_BALANCE);

    assert_eq!(state.store.get_account(from).await.unwrap().balance, 50);
    assert_eq!(state.store.get_account(to).await.unwrap().balance, 1000);
    assert!(
        state
            .store
            .list_transfers(from, 10, 0)
            .await
            .unwrap()
            .is_empty()
    );
}
