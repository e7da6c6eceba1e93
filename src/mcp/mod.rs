//! MCP server registry, dispatch, and transport
//!
//! Servers are built from the configuration document and published as
//! immutable registry generations that can be replaced without restarting
//! the process.
//!
//! # Architecture
//!
//! - [`McpServerRegistry`] - Publishes snapshots of built server instances
//! - [`McpServerInstance`] - One server with its bound tools, resources, and prompts
//! - [`service`] - JSON-RPC dispatch for an instance
//! - [`http_transport`] - Routing and the per-exchange transport
//! - [`watcher`] - Reloads the registry when the configuration file changes
//!
//! # Example
//!
//! ```rust,no_run
//! use dynamcp::builtins;
//! use dynamcp::mcp::{http_transport, McpServerRegistry};
//! use serde_json::json;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = McpServerRegistry::new(builtins::catalog());
//! registry.reload_from_path(Path::new("config.json")).await?;
//!
//! let request = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
//! let response = http_transport::route(&registry, Some("calculator"), request).await?;
//! # Ok(())
//! # }
//! ```

pub mod http_transport;
pub mod instance;
pub mod registry;
pub mod service;
pub mod watcher;

pub use http_transport::{handle_default_server, handle_named_server, route, ExchangeTransport};
pub use instance::McpServerInstance;
pub use registry::{McpServerRegistry, RegistryError, SharedRegistry};
pub use watcher::ConfigWatcher;
