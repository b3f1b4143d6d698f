#![allow(clippy::unwrap_used)]
// Integration tests for `TokenClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use padwatch_api::{ClientCredentials, Error, TokenClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TokenClient) {
    let server = MockServer::start().await;
    let token_url = Url::parse(&format!("{}/connect/token", server.uri())).unwrap();
    let client = TokenClient::with_client(
        reqwest::Client::new(),
        token_url,
        ClientCredentials {
            client_id: "padwatch".into(),
            client_secret: "s3cret".to_string().into(),
        },
    );
    (server, client)
}

fn token_body(token: &str, expires_in: u64) -> serde_json::Value {
    json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": expires_in
    })
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_sends_client_credentials_grant() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=padwatch"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let token = client.token().await.unwrap();
    assert_eq!(token.expose(), "abc");
}

#[tokio::test]
async fn test_token_is_cached_in_memory() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let first = client.token().await.unwrap();
    let second = client.token().await.unwrap();
    assert_eq!(first.expose(), second.expose());
}

#[tokio::test]
async fn test_token_is_reused_from_cache_file() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("from-endpoint", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client.with_cache_file(&cache);
    client.token().await.unwrap();
    assert!(cache.exists());

    // A second process: fresh client, same cache file, no new request.
    let token_url = Url::parse(&format!("{}/connect/token", server.uri())).unwrap();
    let second = TokenClient::with_client(
        reqwest::Client::new(),
        token_url,
        ClientCredentials {
            client_id: "padwatch".into(),
            client_secret: "s3cret".to_string().into(),
        },
    )
    .with_cache_file(&cache);

    let token = second.token().await.unwrap();
    assert_eq!(token.expose(), "from-endpoint");
}

#[tokio::test]
async fn test_invalidate_drops_cache_file_and_refetches() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", 3600)))
        .expect(2)
        .mount(&server)
        .await;

    let client = client.with_cache_file(&cache);
    client.token().await.unwrap();
    assert!(cache.exists());

    client.invalidate();
    assert!(!cache.exists());

    client.token().await.unwrap();
    assert!(cache.exists());
}

#[tokio::test]
async fn test_invalidate_survives_unremovable_cache() {
    let (server, client) = setup().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", 3600)))
        .expect(1)
        .mount(&server)
        .await;

    // A directory cannot be removed with remove_file, and no cache was written.
    let client = client.with_cache_file(dir.path());
    client.invalidate();
    assert!(dir.path().exists());

    let token = client.token().await.unwrap();
    assert_eq!(token.expose(), "abc");
}

#[tokio::test]
async fn test_short_lifetime_forces_refetch() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("abc", 3600)))
        .expect(2)
        .mount(&server)
        .await;

    // Lifetime inside the expiry skew: every token is already stale.
    let client = client.with_lifetime(Duration::from_secs(10));
    client.token().await.unwrap();
    client.token().await.unwrap();
}

#[tokio::test]
async fn test_rejected_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})),
        )
        .mount(&server)
        .await;

    let result = client.token().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_malformed_token_response() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.token().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
