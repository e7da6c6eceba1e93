//! HTTP application assembly

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, mcp, AppState};

/// Largest accepted JSON-RPC request body
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Builds the router serving the MCP endpoints and the health probe
pub fn create_app(state: AppState) -> Router {
    // Authorization and MCP headers are not covered by a wildcard
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CACHE_CONTROL,
            header::USER_AGENT,
            HeaderName::from_static("mcp-protocol-version"),
            HeaderName::from_static("mcp-session-id"),
        ])
        .max_age(Duration::from_secs(3600));

    let mcp_routes = Router::new()
        .route("/mcp", post(mcp::handle_default_server))
        .route("/mcp/{server_name}", post(mcp::handle_named_server))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .merge(mcp_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
