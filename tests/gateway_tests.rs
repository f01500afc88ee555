//! Integration tests for the authenticated request gateway.
//!
//! A wiremock server plays the backend. Call counts are asserted with
//! `expect(n)`, which wiremock verifies when the server is dropped.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use todo_client::config::ApiConfig;
use todo_client::error::ClientError;
use todo_client::gateway::{ApiRequest, Gateway};
use todo_client::store::{Credential, CredentialStore, MemoryStorage, Storage, StorageCredentials};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

struct Harness {
    server: MockServer,
    storage: Arc<MemoryStorage>,
    credentials: Arc<StorageCredentials>,
    gateway: Gateway,
}

/// Gateway pointed at a fresh mock server with `/api/` as its base.
async fn harness(tokens: Option<(&str, &str)>) -> Harness {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::new());
    if let Some((access, refresh)) = tokens {
        storage.set("token", access).unwrap();
        storage.set("refreshToken", refresh).unwrap();
    }
    let credentials = Arc::new(StorageCredentials::new(storage.clone()));
    let api = ApiConfig::with_base_url(format!("{}/api/", server.uri()));
    let gateway = Gateway::new(api, credentials.clone()).expect("gateway");
    Harness {
        server,
        storage,
        credentials,
        gateway,
    }
}

fn tasks_body() -> serde_json::Value {
    json!([{ "id": 1, "title": "Buy milk", "completed": false }])
}

// =============================================================================
// SEND
// =============================================================================

#[tokio::test]
async fn send_attaches_bearer_token() {
    let h = harness(Some(("access-1", "refresh-1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks_body()))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h.gateway.send(&ApiRequest::get("")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn send_without_credential_omits_authorization() {
    let h = harness(None).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks_body()))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h.gateway.send(&ApiRequest::get("")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn non_auth_errors_are_returned_unmodified() {
    let h = harness(Some(("access-1", "refresh-1"))).await;

    Mock::given(method("DELETE"))
        .and(path("/api/9/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "x" })))
        .expect(0)
        .mount(&h.server)
        .await;

    let response = h.gateway.send(&ApiRequest::delete("9/")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert_eq!(response.text().await.unwrap(), "missing");
}

#[tokio::test]
async fn unauthorized_refreshes_once_and_retries_once() {
    let h = harness(Some(("stale", "refresh-1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .and(body_json(json!({ "refresh": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh" })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks_body()))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h.gateway.send(&ApiRequest::get("")).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(h.credentials.access_token().as_deref(), Some("fresh"));
    assert_eq!(h.credentials.refresh_token().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn retry_happens_at_most_once() {
    let h = harness(Some(("stale", "refresh-1"))).await;

    // The backend rejects every token, including the refreshed one.
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h.gateway.send(&ApiRequest::get("")).await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn refresh_failure_clears_credential_and_returns_original_response() {
    let h = harness(Some(("stale", "revoked"))).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "revoked" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let response = h.gateway.send(&ApiRequest::get("")).await.unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "expired");
    assert!(h.credentials.get().is_none());
    assert!(h.storage.get("token").is_none());
    assert!(h.storage.get("refreshToken").is_none());
    assert!(!h.gateway.is_authenticated());
}

#[tokio::test]
async fn send_does_not_mutate_the_request() {
    let h = harness(Some(("stale", "refresh-1"))).await;

    Mock::given(method("PATCH"))
        .and(path("/api/3/"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "fresh" })))
        .mount(&h.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/3/"))
        .and(header("Authorization", "Bearer fresh"))
        .and(header("X-Client", "todo"))
        .and(body_json(json!({ "completed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({ "id": 3, "title": "t", "completed": true }),
        ))
        .expect(1)
        .mount(&h.server)
        .await;

    let request = ApiRequest::patch("3/")
        .json(&json!({ "completed": true }))
        .unwrap()
        .with_header("X-Client", "todo")
        .with_header("Authorization", "Bearer caller-supplied");
    let before = request.clone();

    let response = h.gateway.send(&request).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(request, before);
}

// =============================================================================
// REFRESH
// =============================================================================

#[tokio::test]
async fn refresh_without_token_makes_no_network_call() {
    let h = harness(None).await;
    h.storage.set("token", "orphan-access").unwrap();

    let err = h.gateway.refresh().await.unwrap_err();

    assert_eq!(err, ClientError::NoRefreshToken);
    assert!(h.storage.get("token").is_none());
    let received = h.server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn refresh_failure_is_repeatable() {
    let h = harness(Some(("stale", "revoked"))).await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;

    let first = h.gateway.refresh().await.unwrap_err();
    assert!(matches!(first, ClientError::RefreshFailed(_)));
    assert!(h.credentials.get().is_none());

    // The credential is gone, so the second attempt never reaches the network.
    let second = h.gateway.refresh().await.unwrap_err();
    assert_eq!(second, ClientError::NoRefreshToken);
    assert!(h.credentials.get().is_none());
}

#[tokio::test]
async fn refresh_stores_rotated_refresh_token() {
    let h = harness(Some(("stale", "refresh-1"))).await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "fresh", "refresh": "refresh-2" })),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    assert_eq!(h.gateway.refresh().await.unwrap(), "fresh");
    assert_eq!(
        h.credentials.get(),
        Some(Credential::new("fresh", "refresh-2"))
    );
}

#[tokio::test]
async fn concurrent_unauthorized_calls_share_one_refresh() {
    let h = harness(Some(("stale", "refresh-1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "fresh" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks_body()))
        .expect(3)
        .mount(&h.server)
        .await;

    let request = ApiRequest::get("");
    let (a, b, c) = tokio::join!(
        h.gateway.send(&request),
        h.gateway.send(&request),
        h.gateway.send(&request)
    );

    for response in [a, b, c] {
        assert_eq!(response.unwrap().status().as_u16(), 200);
    }
    assert_eq!(h.credentials.access_token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn concurrent_refresh_calls_share_one_result() {
    let h = harness(Some(("stale", "refresh-1"))).await;

    Mock::given(method("POST"))
        .and(path("/api/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "fresh" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let g1 = h.gateway.clone();
    let g2 = h.gateway.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { g1.refresh().await }),
        tokio::spawn(async move { g2.refresh().await })
    );

    assert_eq!(a.unwrap().unwrap(), "fresh");
    assert_eq!(b.unwrap().unwrap(), "fresh");
}

// =============================================================================
// LOGIN / LOGOUT
// =============================================================================

#[tokio::test]
async fn login_stores_token_pair_and_list_succeeds() {
    let h = harness(None).await;

    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .and(body_json(json!({ "username": "ada", "password": "secret" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "access-1", "refresh": "refresh-1" })),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks_body()))
        .expect(1)
        .mount(&h.server)
        .await;

    let credential = h.gateway.login("ada", "secret").await.unwrap();

    assert_eq!(credential, Credential::new("access-1", "refresh-1"));
    assert_eq!(h.storage.get("token").as_deref(), Some("access-1"));
    assert_eq!(h.storage.get("refreshToken").as_deref(), Some("refresh-1"));

    let response = h.gateway.send(&ApiRequest::get("")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn login_rejection_is_login_failed() {
    let h = harness(None).await;

    Mock::given(method("POST"))
        .and(path("/api/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({ "detail": "No active account found with the given credentials" }),
        ))
        .expect(1)
        .mount(&h.server)
        .await;

    let err = h.gateway.login("ada", "wrong").await.unwrap_err();

    match err {
        ClientError::LoginFailed(message) => assert!(message.contains("No active account")),
        other => panic!("expected LoginFailed, got {:?}", other),
    }
    assert!(h.credentials.get().is_none());
}

#[tokio::test]
async fn login_unreachable_backend_is_login_failed() {
    let storage = Arc::new(MemoryStorage::new());
    let credentials = Arc::new(StorageCredentials::new(storage));
    // Port 9 (discard) is not expected to be listening.
    let gateway = Gateway::new(ApiConfig::with_base_url("http://127.0.0.1:9/api/"), credentials)
        .unwrap();

    let err = gateway.login("ada", "secret").await.unwrap_err();
    assert!(matches!(err, ClientError::LoginFailed(_)));
}

#[tokio::test]
async fn logout_clears_tokens_without_network() {
    let h = harness(Some(("access-1", "refresh-1"))).await;
    assert!(h.gateway.is_authenticated());

    h.gateway.logout().unwrap();

    assert!(!h.gateway.is_authenticated());
    assert!(h.credentials.get().is_none());
    assert!(h.server.received_requests().await.unwrap().is_empty());
}
