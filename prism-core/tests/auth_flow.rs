//! Integration tests for login, registration, logout and explicit refresh.

use std::sync::Arc;

use prism_core::{
    ApiError, FileStore, HttpTransport, MemoryStore, PrismClient, SecretStore, SessionEvent,
    SignOutReason,
    credential::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
    models::Registration,
};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, header_exists, method, path},
};

async fn client_with(server: &MockServer, store: Arc<dyn SecretStore>) -> PrismClient {
    let transport = HttpTransport::new(Url::parse(&server.uri()).unwrap());
    PrismClient::connect(Arc::new(transport), store).await.unwrap()
}

fn user() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "jane@example.com",
        "email": "jane@example.com",
        "first_name": "Jane",
        "last_name": "Doe",
        "full_name": "Jane Doe"
    })
}

#[tokio::test]
async fn test_login_nested_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({"email": "jane@example.com", "password": "s3cret!"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user(),
            "tokens": {"access": "a1", "refresh": "r1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/profile/"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_with(&server, store.clone()).await;
    let mut events = client.session().subscribe();

    let user = client
        .auth()
        .login("jane@example.com", "s3cret!")
        .await
        .unwrap();

    assert_eq!(user.display_name(), "Jane Doe");
    assert_eq!(events.try_recv().unwrap(), SessionEvent::CredentialEstablished);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap().unwrap().expose(), "a1");
    assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap().unwrap().expose(), "r1");

    client.users().profile().await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_register_flat_tokens() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access": "a2",
            "refresh": "r2",
            "user": user()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryStore::new())).await;

    client
        .auth()
        .register(&Registration::new("jane@example.com", "s3cret!").name("Jane", "Doe"))
        .await
        .unwrap();

    let pair = client.session().credentials().unwrap();
    assert_eq!(pair.access_token().expose(), "a2");
    assert_eq!(pair.refresh_token().expose(), "r2");
}

#[tokio::test]
async fn test_bad_login_does_not_renew() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryStore::new())).await;

    let err = client
        .auth()
        .login("jane@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::ValidationFailed { status: 401, .. }));
    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(!client.session().is_authenticated());
    server.verify().await;
}

#[tokio::test]
async fn test_logout_clears_even_when_backend_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "a1", "refresh": "r1", "user": user()
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .and(header_exists("Authorization"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_with(&server, store.clone()).await;
    client.auth().login("jane@example.com", "s3cret!").await.unwrap();
    let mut events = client.session().subscribe();

    client.auth().logout().await.unwrap();

    assert!(!client.session().is_authenticated());
    assert!(store.is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::SignedOut {
            reason: SignOutReason::Requested
        }
    );
    server.verify().await;
}

#[tokio::test]
async fn test_logout_when_signed_out_skips_backend() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryStore::new())).await;

    client.auth().logout().await.unwrap();
    client.auth().logout().await.unwrap();

    assert!(!client.session().is_authenticated());
    server.verify().await;
}

#[tokio::test]
async fn test_explicit_refresh_rotates_when_offered() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "a1", "refresh": "r1", "user": user()
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a2", "refresh": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with(&server, Arc::new(MemoryStore::new())).await;
    client.auth().login("jane@example.com", "s3cret!").await.unwrap();

    client.auth().refresh().await.unwrap();

    let pair = client.session().credentials().unwrap();
    assert_eq!(pair.access_token().expose(), "a2");
    assert_eq!(pair.refresh_token().expose(), "r2");
    server.verify().await;
}

#[tokio::test]
async fn test_file_store_session_persists() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credentials.json");

    Mock::given(method("POST"))
        .and(wiremock::matchers::path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "a1", "refresh": "r1", "user": user()
        })))
        .mount(&server)
        .await;

    {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let client = client_with(&server, store).await;
        client.auth().login("jane@example.com", "s3cret!").await.unwrap();
    }

    let reopened = Arc::new(FileStore::open(&path).unwrap());
    let client = client_with(&server, reopened).await;
    assert!(client.session().is_authenticated());
}
