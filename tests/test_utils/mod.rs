//! Test utilities for integration tests
#![allow(dead_code)]

use stablepush::api::ApiClient;
use stablepush::core::AppConfig;

pub const DEVICE_42: &str = r#"{
    "id": 42,
    "model": "Pixel 7",
    "token": "abc123",
    "first_seen_at": "2024-01-01T00:00:00Z",
    "last_seen_at": "2024-01-01T00:00:00Z"
}"#;

/// Starts a mock backend and a client pointed at it. The server has to
/// stay alive for as long as the client is used.
pub async fn test_backend() -> (mockito::ServerGuard, ApiClient) {
    let server = mockito::Server::new_async().await;
    let client = ApiClient::new(&AppConfig::new(&server.url())).expect("Failed to build client");
    (server, client)
}

/// Mocks a successful `POST /devices` returning device 42
pub async fn mock_register(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/devices")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "model": "Pixel 7",
            "token": "abc123"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(DEVICE_42)
        .create_async()
        .await
}
