//! Streamable HTTP transport for MCP
//!
//! Every inbound POST is one JSON-RPC exchange. The router resolves the
//! target server from the currently published registry generation, opens an
//! [`ExchangeTransport`] bound to that instance, and runs the message through
//! it. The transport is released when it is dropped, which covers normal
//! completion, handler errors, and the request future being dropped because
//! the client went away.
//!
//! # URL Structure
//!
//! - `POST /mcp` - Dispatch to the first registered server
//! - `POST /mcp/{server_name}` - Dispatch to a named server
//!
//! # Usage
//!
//! ```http
//! POST /mcp/calculator
//! Content-Type: application/json
//!
//! {"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}
//! ```
//!
//! Response:
//! ```http
//! HTTP/1.1 200 OK
//! Content-Type: application/json
//!
//! {"jsonrpc":"2.0","id":1,"result":{"tools":[...]}}
//! ```
//!
//! Notifications are answered with `202 Accepted` and an empty body.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{RouteError, TransportError};
use crate::mcp::instance::McpServerInstance;
use crate::mcp::registry::{ExchangeTracker, McpServerRegistry, SharedRegistry};

/// A transport bound to one server instance for one exchange
///
/// Holding the transport keeps its instance alive even if a reload has
/// since published a generation without it.
pub struct ExchangeTransport {
    id: Uuid,
    instance: Arc<McpServerInstance>,
    opened_at: Instant,
    tracker: Arc<ExchangeTracker>,
}

impl ExchangeTransport {
    pub fn open(instance: Arc<McpServerInstance>, tracker: Arc<ExchangeTracker>) -> Self {
        tracker.acquire();
        let transport = Self {
            id: Uuid::new_v4(),
            instance,
            opened_at: Instant::now(),
            tracker,
        };
        tracing::debug!(exchange = %transport.id, server = %transport.instance.name, "Exchange opened");
        transport
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instance(&self) -> &Arc<McpServerInstance> {
        &self.instance
    }

    /// Runs one JSON-RPC message through the bound instance
    pub async fn exchange(&self, message: Value) -> Option<Value> {
        self.instance.handle_request(message).await
    }
}

impl Drop for ExchangeTransport {
    fn drop(&mut self) {
        self.tracker.release();
        tracing::debug!(
            exchange = %self.id,
            server = %self.instance.name,
            elapsed_ms = self.opened_at.elapsed().as_millis() as u64,
            "Exchange closed"
        );
    }
}

fn check_envelope(payload: &Value) -> Result<(), TransportError> {
    let message = payload.as_object().ok_or(TransportError::NotAMessage)?;
    match message.get("jsonrpc") {
        None => Ok(()),
        Some(Value::String(version)) if version == "2.0" => Ok(()),
        Some(other) => Err(TransportError::UnsupportedVersion(match other {
            Value::String(version) => version.clone(),
            value => value.to_string(),
        })),
    }
}

/// Routes one payload to a server and runs the exchange
///
/// # Arguments
///
/// * `registry` - Registry whose current generation is consulted once
/// * `server_name` - Target server, or `None` for the first registered one
/// * `payload` - JSON-RPC message
///
/// # Returns
///
/// * `Ok(Some(response))` - JSON-RPC response
/// * `Ok(None)` - The message was a notification
/// * `Err(RouteError)` - No server could be selected or the payload is not a message
pub async fn route(
    registry: &McpServerRegistry,
    server_name: Option<&str>,
    payload: Value,
) -> Result<Option<Value>, RouteError> {
    check_envelope(&payload)?;

    let snapshot = registry.snapshot().await;
    let instance = match server_name {
        Some(name) => snapshot.get(name).ok_or_else(|| {
            tracing::warn!(server = %name, "MCP server not found");
            RouteError::ServerNotFound(name.to_string())
        })?,
        None => snapshot.first().ok_or_else(|| {
            tracing::warn!("No MCP servers available");
            RouteError::NoServersAvailable
        })?,
    };
    drop(snapshot);

    let method = payload
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("<none>")
        .to_string();
    tracing::info!(server = %instance.name, method = %method, "Routing MCP request");

    let transport = ExchangeTransport::open(instance, registry.exchanges());
    Ok(transport.exchange(payload).await)
}

fn into_http_response(response: Option<Value>) -> Response {
    match response {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// POST /mcp - Dispatch to the first registered server
///
/// # Returns
///
/// * `200 OK` with the JSON-RPC response
/// * `202 Accepted` for notifications
/// * `503 Service Unavailable` if no servers are registered
/// * `400 Bad Request` if the body is not a single JSON-RPC message
pub async fn handle_default_server(
    State(registry): State<SharedRegistry>,
    Json(payload): Json<Value>,
) -> Result<Response, RouteError> {
    let response = route(&registry, None, payload).await?;
    Ok(into_http_response(response))
}

/// POST /mcp/{server_name} - Dispatch to a named server
///
/// # Returns
///
/// * `200 OK` with the JSON-RPC response
/// * `202 Accepted` for notifications
/// * `404 Not Found` if the server is not in the current generation
/// * `400 Bad Request` if the body is not a single JSON-RPC message
pub async fn handle_named_server(
    Path(server_name): Path<String>,
    State(registry): State<SharedRegistry>,
    Json(payload): Json<Value>,
) -> Result<Response, RouteError> {
    let response = route(&registry, Some(&server_name), payload).await?;
    Ok(into_http_response(response))
}
