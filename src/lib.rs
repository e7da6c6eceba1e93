pub mod app;
pub mod builtins;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use axum::extract::FromRef;
use std::time::Instant;

use crate::mcp::registry::SharedRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            started_at: Instant::now(),
        }
    }
}

impl FromRef<AppState> for SharedRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.registry.clone()
    }
}
