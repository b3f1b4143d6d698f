#![allow(clippy::unwrap_used)]
// Integration tests for `FleetClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use padwatch_api::{Error, FleetClient, LaunchpadRecord, TransportConfig};

async fn setup() -> (MockServer, FleetClient) {
    let server = MockServer::start().await;
    let client = FleetClient::from_api_key(
        &server.uri(),
        &"fleet-key".to_string().into(),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

fn record(name: &str, connected: bool, count: u32) -> serde_json::Value {
    json!({
        "name": name,
        "connected": connected,
        "hubConnected": connected,
        "connectedDeviceCount": count
    })
}

#[tokio::test]
async fn test_list_launchpads_filters_by_owner() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/launchpads"))
        .and(query_param("owner", "store-42"))
        .and(header("X-API-KEY", "fleet-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [record("LP-01", true, 3), record("LP-02", false, 0)],
            "offset": 0,
            "limit": 200,
            "totalCount": 2
        })))
        .mount(&server)
        .await;

    let devices = client.list_all_launchpads("store-42").await.unwrap();

    assert_eq!(
        devices,
        vec![
            LaunchpadRecord {
                name: "LP-01".into(),
                connected: true,
                hub_connected: true,
                connected_device_count: 3,
            },
            LaunchpadRecord {
                name: "LP-02".into(),
                connected: false,
                hub_connected: false,
                connected_device_count: 0,
            },
        ]
    );
}

#[tokio::test]
async fn test_list_all_follows_pagination() {
    let (server, client) = setup().await;

    let first_page: Vec<_> = (0..200).map(|i| record(&format!("LP-{i:03}"), true, 1)).collect();

    Mock::given(method("GET"))
        .and(path("/v1/launchpads"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": first_page,
            "offset": 0,
            "limit": 200,
            "totalCount": 201
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/launchpads"))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [record("LP-200", true, 1)],
            "offset": 200,
            "limit": 200,
            "totalCount": 201
        })))
        .mount(&server)
        .await;

    let devices = client.list_all_launchpads("store-42").await.unwrap();
    assert_eq!(devices.len(), 201);
    assert_eq!(devices[200].name, "LP-200");
}

#[tokio::test]
async fn test_data_only_envelope_is_accepted() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/launchpads"))
        .and(query_param("owner", "store-42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [record("LP-01", true, 3)] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_all_launchpads("store-42").await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name, "LP-01");
    assert_eq!(devices[0].connected_device_count, 3);
}

#[tokio::test]
async fn test_pagination_without_total_stops_on_short_page() {
    let (server, client) = setup().await;

    let full_page: Vec<_> = (0..200).map(|i| record(&format!("LP-{i:03}"), true, 1)).collect();

    Mock::given(method("GET"))
        .and(path("/v1/launchpads"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": full_page })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/launchpads"))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_all_launchpads("store-42").await.unwrap();
    assert_eq!(devices.len(), 200);
}

#[tokio::test]
async fn test_invalid_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_all_launchpads("store-42").await;
    assert!(
        matches!(result, Err(Error::InvalidApiKey)),
        "expected InvalidApiKey, got: {result:?}"
    );
}

#[tokio::test]
async fn test_record_missing_field_fails_fetch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/launchpads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"name": "LP-01", "connected": true}],
            "totalCount": 1
        })))
        .mount(&server)
        .await;

    let result = client.list_all_launchpads("store-42").await;
    match result {
        Err(Error::Deserialization { ref message, .. }) => {
            assert!(message.contains("hubConnected"), "unexpected message: {message}");
        }
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_all_launchpads("store-42").await.unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Api {
            surface, status, ..
        } => {
            assert_eq!(surface, "fleet");
            assert_eq!(status, 503);
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_backend_reports_configured_timeout() {
    let server = MockServer::start().await;
    let transport = TransportConfig {
        timeout: std::time::Duration::from_secs(1),
        ..TransportConfig::default()
    };
    let client =
        FleetClient::from_api_key(&server.uri(), &"fleet-key".to_string().into(), &transport)
            .unwrap();

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [] }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client.list_all_launchpads("store-42").await.unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Timeout { timeout_secs } => assert_eq!(timeout_secs, 1),
        other => panic!("expected Timeout, got: {other:?}"),
    }
}
