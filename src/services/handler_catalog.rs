//! Handler catalog
//!
//! Maps a stable `(source locator, entry name)` pair to a callable. Handler
//! references in the configuration document are resolved against the
//! catalog once, at bind time; the resolved [`Handler`] is then held by the
//! capability binding for the lifetime of its registry generation.
//!
//! # Locators
//!
//! Locators are normalized before lookup: surrounding whitespace and a
//! leading `./` are dropped, as is the extension of the final path segment.
//! `handlers/calculator.js`, `./handlers/calculator` and `handlers/calculator`
//! all name the same module.
//!
//! # Usage
//!
//! ```rust
//! use dynamcp::services::handler_catalog::HandlerCatalog;
//! use serde_json::{Map, Value};
//!
//! async fn echo(params: Map<String, Value>) -> anyhow::Result<Value> {
//!     Ok(Value::Object(params))
//! }
//!
//! let mut catalog = HandlerCatalog::new();
//! catalog.register_params("handlers/echo", "echo", echo);
//! assert!(catalog.contains("./handlers/echo.js", "echo"));
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::document::{CapabilityKind, HandlerRef};

/// Callable taking a parameter record (tools and prompts)
#[async_trait]
pub trait ParamsHandler: Send + Sync {
    async fn call(&self, params: Map<String, Value>) -> anyhow::Result<Value>;
}

#[async_trait]
impl<F, Fut> ParamsHandler for F
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn call(&self, params: Map<String, Value>) -> anyhow::Result<Value> {
        (self)(params).await
    }
}

/// Callable taking the requested URI and its template variables (resources)
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self, uri: String, params: Map<String, Value>) -> anyhow::Result<Value>;
}

#[async_trait]
impl<F, Fut> ResourceHandler for F
where
    F: Fn(String, Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn read(&self, uri: String, params: Map<String, Value>) -> anyhow::Result<Value> {
        (self)(uri, params).await
    }
}

/// A resolved, invokable export
#[derive(Clone)]
pub enum Handler {
    Params(Arc<dyn ParamsHandler>),
    Resource(Arc<dyn ResourceHandler>),
}

impl Handler {
    /// Whether this export has the calling convention `kind` requires
    pub fn supports(&self, kind: CapabilityKind) -> bool {
        matches!(
            (self, kind),
            (Handler::Params(_), CapabilityKind::Tool)
                | (Handler::Params(_), CapabilityKind::Prompt)
                | (Handler::Resource(_), CapabilityKind::Resource)
        )
    }

    pub fn convention(&self) -> &'static str {
        match self {
            Handler::Params(_) => "params",
            Handler::Resource(_) => "resource",
        }
    }

    /// Invokes the export; `target` is the resource URI and is ignored by params handlers
    pub async fn invoke(&self, target: &str, params: Map<String, Value>) -> anyhow::Result<Value> {
        match self {
            Handler::Params(handler) => handler.call(params).await,
            Handler::Resource(handler) => handler.read(target.to_string(), params).await,
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler::{}", self.convention())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("source '{0}' not found")]
    SourceNotFound(String),

    #[error("no export named '{entry}' in '{locator}'")]
    EntryNotFound { locator: String, entry: String },
}

/// One catalog listing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub locator: String,
    pub entry: String,
    pub convention: &'static str,
}

#[derive(Clone, Default)]
pub struct HandlerCatalog {
    modules: HashMap<String, HashMap<String, Handler>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of a source locator
    pub fn normalize_locator(locator: &str) -> String {
        let trimmed = locator.trim();
        let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
        let path = Path::new(trimmed);

        match (path.parent(), path.file_stem()) {
            (Some(parent), Some(stem)) if !parent.as_os_str().is_empty() => {
                format!("{}/{}", parent.to_string_lossy(), stem.to_string_lossy())
            }
            (_, Some(stem)) => stem.to_string_lossy().into_owned(),
            _ => trimmed.to_string(),
        }
    }

    pub fn register(&mut self, locator: &str, entry: &str, handler: Handler) -> &mut Self {
        self.modules
            .entry(Self::normalize_locator(locator))
            .or_default()
            .insert(entry.to_string(), handler);
        self
    }

    pub fn register_params<H>(&mut self, locator: &str, entry: &str, handler: H) -> &mut Self
    where
        H: ParamsHandler + 'static,
    {
        self.register(locator, entry, Handler::Params(Arc::new(handler)))
    }

    pub fn register_resource<H>(&mut self, locator: &str, entry: &str, handler: H) -> &mut Self
    where
        H: ResourceHandler + 'static,
    {
        self.register(locator, entry, Handler::Resource(Arc::new(handler)))
    }

    pub fn contains(&self, locator: &str, entry: &str) -> bool {
        self.modules
            .get(&Self::normalize_locator(locator))
            .is_some_and(|module| module.contains_key(entry))
    }

    /// Resolves a handler reference without invoking it
    ///
    /// # Errors
    ///
    /// * `ResolveError::SourceNotFound` - No module under the locator
    /// * `ResolveError::EntryNotFound` - The module has no such export
    pub fn resolve(&self, handler_ref: &HandlerRef) -> Result<Handler, ResolveError> {
        let locator = Self::normalize_locator(&handler_ref.source_locator);
        let module = self
            .modules
            .get(&locator)
            .ok_or_else(|| ResolveError::SourceNotFound(handler_ref.source_locator.clone()))?;

        module
            .get(&handler_ref.entry_name)
            .cloned()
            .ok_or_else(|| ResolveError::EntryNotFound {
                locator: handler_ref.source_locator.clone(),
                entry: handler_ref.entry_name.clone(),
            })
    }

    /// Every export, sorted by locator then entry name
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let sorted: BTreeMap<_, _> = self.modules.iter().collect();
        sorted
            .into_iter()
            .flat_map(|(locator, module)| {
                let exports: BTreeMap<_, _> = module.iter().collect();
                exports.into_iter().map(move |(entry, handler)| CatalogEntry {
                    locator: locator.clone(),
                    entry: entry.clone(),
                    convention: handler.convention(),
                })
            })
            .collect()
    }
}
