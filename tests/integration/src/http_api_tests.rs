//! HTTP API end to end
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`,
//! without binding a socket.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chainsign_core::Config;
use chainsign_crypto::{genesis_signature, verify_chain, ChainLink, VerifyResult};
use chainsign_node::{app, AppState, ErrorResponse};
use chainsign_store::DeviceStore;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::test_utils::{init_tracing, test_state};

const BODY_LIMIT: usize = 1024 * 1024;

fn router() -> Router {
    app(test_state(), false)
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, bytes) = send(router, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    init_tracing();
    let router = router();

    let (status, body) = send_json(&router, Method::GET, "/api/v0/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pass");
    assert_eq!(body["data"]["version"], "v0");

    let (status, body) = send_json(&router, Method::POST, "/api/v0/health", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert_eq!(error.errors.len(), 1);
}

#[tokio::test]
async fn test_device_lifecycle() {
    let router = router();

    let (status, created) = send_json(
        &router,
        Method::POST,
        "/api/v1/devices",
        Some(json!({"signature_algorithm": "RSA", "label": "wallet-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["signature_algorithm"], "RSA");
    assert_eq!(created["label"], "wallet-1");
    assert_eq!(created["counter"], 0);
    assert!(created["public_key"]
        .as_str()
        .unwrap()
        .contains("BEGIN PUBLIC KEY"));

    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(created["last_signature"], genesis_signature(&id));

    let sign_uri = format!("/api/v1/devices/{}/signatures", id);
    let (status, s1) = send_json(
        &router,
        Method::POST,
        &sign_uri,
        Some(json!({"data_to_be_signed": "tx1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        s1["signed_data"],
        format!("0_tx1_{}", genesis_signature(&id))
    );

    let (_, s2) = send_json(
        &router,
        Method::POST,
        &sign_uri,
        Some(json!({"data_to_be_signed": "tx2"})),
    )
    .await;
    assert_eq!(
        s2["signed_data"],
        format!("1_tx2_{}", s1["signature"].as_str().unwrap())
    );

    let (status, fetched) =
        send_json(&router, Method::GET, &format!("/api/v1/devices/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["counter"], 2);
    assert_eq!(fetched["last_signature"], s2["signature"]);

    let (status, listed) = send_json(&router, Method::GET, "/api/v1/devices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([{"id": id.to_string(), "label": "wallet-1"}]));
}

#[tokio::test]
async fn test_signatures_verify_against_published_key() {
    let state = test_state();
    let router = app(state.clone(), false);

    let (_, created) = send_json(
        &router,
        Method::POST,
        "/api/v1/devices",
        Some(json!({"signature_algorithm": "ECC"})),
    )
    .await;
    assert!(created.get("label").is_none());
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();

    let mut links = Vec::new();
    for payload in ["a", "b", "c"] {
        let (_, record) = send_json(
            &router,
            Method::POST,
            &format!("/api/v1/devices/{}/signatures", id),
            Some(json!({"data_to_be_signed": payload})),
        )
        .await;
        links.push(ChainLink {
            signed_data: record["signed_data"].as_str().unwrap().to_string(),
            signature: record["signature"].as_str().unwrap().to_string(),
        });
    }

    let device = state.store.get(id).await.unwrap();
    assert_eq!(
        verify_chain(device.key_pair(), device.digest(), &genesis_signature(&id), &links),
        VerifyResult::Ok
    );
}

#[tokio::test]
async fn test_invalid_algorithm_is_bad_request() {
    let router = router();

    let (status, body) = send_json(
        &router,
        Method::POST,
        "/api/v1/devices",
        Some(json!({"signature_algorithm": "DSA"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert!(error.errors[0].contains("DSA"));

    let (_, listed) = send_json(&router, Method::GET, "/api/v1/devices", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_unknown_device_is_not_found() {
    let router = router();
    let id = Uuid::new_v4();

    let (status, body) =
        send_json(&router, Method::GET, &format!("/api/v1/devices/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0], format!("device {} not found", id));

    let (status, _) = send_json(
        &router,
        Method::POST,
        &format!("/api/v1/devices/{}/signatures", id),
        Some(json!({"data_to_be_signed": "tx"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_requests_are_bad_request() {
    let router = router();

    let (status, body) =
        send_json(&router, Method::GET, "/api/v1/devices/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_array());

    let (status, _) = send_json(
        &router,
        Method::POST,
        "/api/v1/devices",
        Some(json!({"label": "missing algorithm"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_served() {
    let router = router();
    let (status, body) = send(&router, Method::GET, "/api/v1/openapi.yaml", None).await;

    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.starts_with("openapi:"));
}

#[tokio::test]
async fn test_cors_headers_when_enabled() {
    let router = app(test_state(), true);
    let request = Request::builder()
        .uri("/api/v0/health")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_router_from_config_honors_enabled_algorithms() {
    let mut config = Config::default_config();
    config.keys.algorithms = vec!["ED25519".to_string()];
    config.validate().unwrap();

    let state = Arc::new(AppState::from_config(&config).unwrap());
    let router = app(state, config.server.cors_enabled);

    let (status, _) = send_json(
        &router,
        Method::POST,
        "/api/v1/devices",
        Some(json!({"signature_algorithm": "ED25519"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_json(
        &router,
        Method::POST,
        "/api/v1/devices",
        Some(json!({"signature_algorithm": "RSA"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
