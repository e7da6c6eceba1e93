use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use dynamcp::{app::create_app, mcp::http_transport, test_utils::test_helpers, AppState};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

async fn loaded_app() -> (Router, AppState) {
    let (registry, _) = test_helpers::test_registry();
    registry
        .reload(test_helpers::parse_config(&test_helpers::sample_config()).unwrap())
        .await
        .unwrap();
    let state = AppState::new(registry);
    (create_app(state.clone()), state)
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_named_server_dispatch() {
    let (app, _) = loaded_app().await;

    let request = test_helpers::tool_call(1, "add", json!({"a": 2, "b": 3}));
    let response = app.oneshot(post("/mcp/calculator", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["structuredContent"], json!({"result": 5}));
}

#[tokio::test]
async fn test_default_route_uses_first_server() {
    let (app, _) = loaded_app().await;

    let request = test_helpers::rpc(1, "initialize", json!({}));
    let response = app.oneshot(post("/mcp", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["serverInfo"]["name"], "calculator");
}

#[tokio::test]
async fn test_unknown_server_is_not_found_and_server_keeps_serving() {
    let (app, _) = loaded_app().await;

    let request = test_helpers::rpc(1, "tools/list", json!({}));
    let response = app
        .clone()
        .oneshot(post("/mcp/engineering", &request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"], "MCP server 'engineering' not found");

    let response = app.oneshot(post("/mcp/greeter", &request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_empty_registry_is_unavailable() {
    let (registry, _) = test_helpers::test_registry();
    let app = create_app(AppState::new(registry));

    let request = test_helpers::rpc(1, "ping", json!({}));
    let response = app.oneshot(post("/mcp", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let (app, _) = loaded_app().await;

    let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    let response = app
        .oneshot(post("/mcp/calculator", &notification))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_batch_payload_is_bad_request() {
    let (app, _) = loaded_app().await;

    let batch = json!([test_helpers::rpc(1, "ping", json!({}))]);
    let response = app.oneshot(post("/mcp/calculator", &batch)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_registry() {
    let (app, _) = loaded_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_u64());
    assert!(body["timestamp"].is_string());
    assert_eq!(body["registry"]["generation"], 1);
    assert_eq!(body["registry"]["servers"], json!(["calculator", "greeter"]));
}

#[tokio::test]
async fn test_exchange_released_after_handler_error() {
    let (_, state) = loaded_app().await;

    let request = test_helpers::tool_call(1, "fail", json!({}));
    let response = http_transport::route(&state.registry, Some("calculator"), request)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response["result"]["isError"], true);
    assert_eq!(state.registry.exchanges().active(), 0);
}

#[tokio::test]
async fn test_client_disconnect_releases_exchange() {
    let (_, state) = loaded_app().await;
    let exchanges = state.registry.exchanges();

    let pending = {
        let registry = state.registry.clone();
        tokio::spawn(async move {
            let request = test_helpers::tool_call(1, "wait", json!({"ms": 60_000}));
            http_transport::route(&registry, Some("calculator"), request).await
        })
    };

    for _ in 0..100 {
        if exchanges.active() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(exchanges.active(), 1);

    // Dropping the request future is what a closed connection does
    pending.abort();
    let joined = pending.await;
    assert!(joined.unwrap_err().is_cancelled());

    assert_eq!(exchanges.active(), 0);
    assert_eq!(state.registry.status().await.active_exchanges, 0);
}

#[tokio::test]
async fn test_unmatched_route_is_json_not_found() {
    let (app, _) = loaded_app().await;

    let response = app
        .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_large_request_body_is_accepted() {
    let (app, _) = loaded_app().await;

    // Well past axum's 2 MB default, under the 10 MB limit
    let padding = "x".repeat(3 * 1024 * 1024);
    let request = test_helpers::tool_call(1, "add", json!({"a": 2, "b": 3, "note": padding}));
    let response = app.oneshot(post("/mcp/calculator", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"]["structuredContent"], json!({"result": 5}));
}

#[tokio::test]
async fn test_oversized_request_body_is_rejected() {
    let (app, _) = loaded_app().await;

    let padding = "x".repeat(11 * 1024 * 1024);
    let request = test_helpers::tool_call(1, "add", json!({"a": 2, "b": 3, "note": padding}));
    let response = app.oneshot(post("/mcp/calculator", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
