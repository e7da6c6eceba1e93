use crate::mcp::registry::RegistryStatus;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Seconds since the process started
    pub uptime: u64,
    pub timestamp: DateTime<Utc>,
    pub registry: RegistryStatus,
}

/// GET /health - Liveness probe
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
        registry: state.registry.status().await,
    })
}
