#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chat_service::config::{ChatConfig, DiscoveryConfig};
use chat_service::services::gateways::{DiscoveryClient, DiscoveryGateway, GenerationGateway};
use chat_service::startup::{build_router, AppState};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Nothing listens here, so every connection is refused.
pub const UNREACHABLE: &str = "http://127.0.0.1:1";

pub fn test_config() -> ChatConfig {
    ChatConfig {
        common: CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        discovery: None,
        generation: None,
        iam_url: UNREACHABLE.to_string(),
        gateway_timeout: Duration::from_secs(2),
    }
}

/// A real Discovery client pointed at an address with no listener.
pub fn unreachable_discovery() -> Arc<dyn DiscoveryGateway> {
    let client = DiscoveryClient::new(
        DiscoveryConfig {
            api_key: "test-key".to_string(),
            url: UNREACHABLE.to_string(),
            project_id: "test-project".to_string(),
            version: "2023-03-31".to_string(),
        },
        UNREACHABLE,
        Duration::from_secs(2),
    )
    .expect("Failed to build discovery client");
    Arc::new(client)
}

pub fn router(
    discovery: Option<Arc<dyn DiscoveryGateway>>,
    generation: Option<Arc<dyn GenerationGateway>>,
) -> Router {
    build_router(AppState::new(discovery, generation))
}

pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}
