/// Wire-level tests for the hosted backend client
use serde_json::json;
use tweeter_backend::{AuthApi, PostsApi, RestBackend};
use tweeter_common::{BackendConfig, ClientError, PostDraft};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> RestBackend {
    RestBackend::new(&BackendConfig {
        url: server.uri(),
        anon_key: "anon-key".to_string(),
        posts_table: "Tweets".to_string(),
        timeout_secs: 5,
        offline: false,
    })
    .expect("client builds")
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(json!({"email": "alice@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-123",
            "refresh_token": "refresh-456",
            "token_type": "bearer",
            "user": {"id": "user-1", "email": "alice@example.com"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_posts_orders_by_date_and_sends_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/Tweets"))
        .and(query_param("select", "*"))
        .and(query_param("order", "date.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 2, "content": "second", "userName": "bob", "date": "2024-01-02T00:00:00Z"},
            {"id": 1, "content": "first", "userName": "alice", "date": "2024-01-01T00:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let posts = backend_for(&server).list_posts().await.unwrap();

    let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(posts[0].author, "bob");
}

#[tokio::test]
async fn test_list_posts_null_body_is_empty_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/Tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&server)
        .await;

    let posts = backend_for(&server).list_posts().await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_list_posts_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/Tweets"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = backend_for(&server).list_posts().await.unwrap_err();
    assert_eq!(
        err,
        ClientError::Api {
            status: 503,
            message: "maintenance".to_string()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_create_post_returns_stored_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/Tweets"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": 42, "content": "hello", "userName": "alice", "date": "2024-01-01T00:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let stored = backend_for(&server)
        .create_post(&PostDraft::new("hello", "alice"))
        .await
        .unwrap();

    assert_eq!(stored.id, "42");
    assert_eq!(stored.content, "hello");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body[0]["content"], "hello");
    assert_eq!(body[0]["userName"], "alice");
}

#[tokio::test]
async fn test_create_post_empty_response_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/Tweets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .create_post(&PostDraft::new("hello", "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_sign_in_uses_session_token_afterwards() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/Tweets"))
        .and(header("Authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let mut sessions = backend.subscribe();

    let session = backend
        .sign_in_with_password("alice@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(session.user.email.as_deref(), Some("alice@example.com"));

    sessions.changed().await.unwrap();
    assert_eq!(sessions.borrow().as_ref().map(|s| s.access_token.as_str()), Some("jwt-123"));

    backend.list_posts().await.unwrap();
}

#[tokio::test]
async fn test_sign_in_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend
        .sign_in_with_password("alice@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthenticated(_)));
    assert!(backend.get_session().is_none());
}

#[tokio::test]
async fn test_sign_out_clears_session_even_when_remote_fails() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend
        .sign_in_with_password("alice@example.com", "secret")
        .await
        .unwrap();

    assert!(backend.sign_out().await.is_err());
    assert!(backend.get_session().is_none());

    // Second sign-out has nothing to do
    assert!(backend.sign_out().await.is_ok());
}
