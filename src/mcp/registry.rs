//! Hot-reloadable MCP server registry
//!
//! The registry publishes immutable [`RegistrySnapshot`]s. A reload builds a
//! complete new snapshot off to the side and, only if every enabled server
//! builds, replaces the published `Arc` in one step. Readers clone the `Arc`
//! they find and keep using it for as long as they need; a reload never
//! mutates a snapshot somebody may be holding.
//!
//! Reloads are serialized by a dedicated lock so two triggers can never
//! interleave into one partially applied mapping.
//!
//! # Failure Policy
//!
//! A reload is all-or-nothing across the whole document: if any enabled
//! server fails to build, the reload is aborted and the previous generation
//! keeps serving every server it had.

use crate::config::document::{self, ConfigDocument, ConfigError};
use crate::mcp::instance::McpServerInstance;
use crate::services::capability_binder::BuildError;
use crate::services::handler_catalog::HandlerCatalog;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build server '{server}': {source}")]
    Build {
        server: String,
        #[source]
        source: BuildError,
    },
}

/// One published generation of the registry
pub struct RegistrySnapshot {
    generation: u64,
    servers: Vec<Arc<McpServerInstance>>,
    index: HashMap<String, usize>,
    document: Option<Arc<ConfigDocument>>,
}

impl RegistrySnapshot {
    fn empty() -> Self {
        Self {
            generation: 0,
            servers: Vec::new(),
            index: HashMap::new(),
            document: None,
        }
    }

    /// Builds every enabled server of `document` into a new snapshot
    fn build(
        generation: u64,
        document: ConfigDocument,
        catalog: &HandlerCatalog,
    ) -> Result<Self, RegistryError> {
        let mut servers = Vec::new();
        let mut index = HashMap::new();

        for descriptor in document.enabled_servers() {
            let instance = McpServerInstance::build(descriptor, catalog).map_err(|source| {
                tracing::error!(server = %descriptor.name, error = %source, "Failed to build server");
                RegistryError::Build {
                    server: descriptor.name.clone(),
                    source,
                }
            })?;
            index.insert(descriptor.name.clone(), servers.len());
            servers.push(Arc::new(instance));
        }

        Ok(Self {
            generation,
            servers,
            index,
            document: Some(Arc::new(document)),
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, name: &str) -> Option<Arc<McpServerInstance>> {
        self.index
            .get(name)
            .and_then(|&i| self.servers.get(i))
            .map(Arc::clone)
    }

    /// First server in document order
    pub fn first(&self) -> Option<Arc<McpServerInstance>> {
        self.servers.first().map(Arc::clone)
    }

    /// Server names in document order
    pub fn names(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn document(&self) -> Option<Arc<ConfigDocument>> {
        self.document.clone()
    }
}

/// Read-only registry status for operators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatus {
    pub generation: u64,
    pub servers: Vec<String>,
    pub total_servers: usize,
    pub enabled_servers: usize,
    pub active_exchanges: usize,
}

/// Outcome of a successful reload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadSummary {
    pub generation: u64,
    pub servers: Vec<String>,
}

/// Counts exchanges currently holding a server instance
#[derive(Debug, Default)]
pub struct ExchangeTracker {
    active: AtomicUsize,
}

impl ExchangeTracker {
    pub fn acquire(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Thread-safe registry of MCP server instances
///
/// Manages a generation of [`McpServerInstance`]s indexed by server name.
///
/// # Examples
///
/// ```rust,no_run
/// use dynamcp::builtins;
/// use dynamcp::mcp::registry::McpServerRegistry;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = McpServerRegistry::new(builtins::catalog());
/// registry.reload_from_path(Path::new("config.json")).await?;
///
/// let names = registry.get_all_server_names().await;
/// let instance = registry.get_server(&names[0]).await;
/// # Ok(())
/// # }
/// ```
pub struct McpServerRegistry {
    catalog: Arc<HandlerCatalog>,
    active: RwLock<Arc<RegistrySnapshot>>,
    reload_lock: Mutex<u64>,
    exchanges: Arc<ExchangeTracker>,
}

pub type SharedRegistry = Arc<McpServerRegistry>;

impl McpServerRegistry {
    /// Creates an empty registry (generation 0)
    pub fn new(catalog: HandlerCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            active: RwLock::new(Arc::new(RegistrySnapshot::empty())),
            reload_lock: Mutex::new(0),
            exchanges: Arc::new(ExchangeTracker::default()),
        }
    }

    pub fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    pub fn exchanges(&self) -> Arc<ExchangeTracker> {
        Arc::clone(&self.exchanges)
    }

    /// Rebuilds the registry from `document` and publishes it atomically
    ///
    /// # Arguments
    ///
    /// * `document` - Freshly loaded configuration document
    ///
    /// # Returns
    ///
    /// * `Ok(ReloadSummary)` - New generation published
    /// * `Err(RegistryError::Build)` - A server failed; the previous generation is untouched
    pub async fn reload(&self, document: ConfigDocument) -> Result<ReloadSummary, RegistryError> {
        let mut last_generation = self.reload_lock.lock().await;
        let generation = *last_generation + 1;

        let snapshot = RegistrySnapshot::build(generation, document, &self.catalog)?;
        let summary = ReloadSummary {
            generation,
            servers: snapshot.names(),
        };

        *self.active.write().await = Arc::new(snapshot);
        *last_generation = generation;

        tracing::info!(
            generation,
            servers = ?summary.servers,
            "Initialized {} MCP server(s)",
            summary.servers.len()
        );

        Ok(summary)
    }

    /// Loads the document at `path` and reloads from it
    ///
    /// Parse and shape errors leave the previous generation in force, exactly
    /// like build errors.
    pub async fn reload_from_path(&self, path: &Path) -> Result<ReloadSummary, RegistryError> {
        let document = document::load_from_path(path).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
            e
        })?;
        self.reload(document).await
    }

    /// The currently published snapshot
    pub async fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&*self.active.read().await)
    }

    pub async fn get_server(&self, name: &str) -> Option<Arc<McpServerInstance>> {
        self.snapshot().await.get(name)
    }

    pub async fn get_all_server_names(&self) -> Vec<String> {
        self.snapshot().await.names()
    }

    /// The active configuration document, if one has been loaded
    pub async fn get_config(&self) -> Option<Arc<ConfigDocument>> {
        self.snapshot().await.document()
    }

    pub async fn status(&self) -> RegistryStatus {
        let snapshot = self.snapshot().await;
        let (total_servers, enabled_servers) = snapshot
            .document()
            .map(|d| (d.servers.len(), d.enabled_servers().count()))
            .unwrap_or((0, 0));

        RegistryStatus {
            generation: snapshot.generation(),
            servers: snapshot.names(),
            total_servers,
            enabled_servers,
            active_exchanges: self.exchanges.active(),
        }
    }
}
