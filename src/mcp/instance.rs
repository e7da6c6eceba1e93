//! MCP server instance construction
//!
//! Each [`McpServerInstance`] is built from one enabled server descriptor.
//! Construction binds every tool, resource, and prompt; the first binding
//! failure aborts the build, so a server is either fully capable or absent.
//! Instances are immutable once built and shared by `Arc` between the
//! registry generation that owns them and any exchange still using them.

use crate::config::document::{CapabilityKind, ServerDescriptor};
use crate::services::capability_binder::{BuildError, CapabilityBinder, CapabilityBinding};
use crate::services::handler_catalog::HandlerCatalog;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    Implementation, PromptsCapability, ProtocolVersion, ResourcesCapability, ServerCapabilities,
    ServerInfo, ToolsCapability,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Name-indexed capabilities of one kind, in declaration order
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    entries: Vec<Arc<CapabilityBinding>>,
    index: HashMap<String, usize>,
}

impl CapabilityTable {
    fn insert(&mut self, binding: CapabilityBinding) -> Result<(), BuildError> {
        if self.index.contains_key(binding.name()) {
            return Err(BuildError::CapabilityNameCollision {
                kind: binding.kind(),
                name: binding.name().to_string(),
            });
        }
        self.index.insert(binding.name().to_string(), self.entries.len());
        self.entries.push(Arc::new(binding));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CapabilityBinding>> {
        self.index.get(name).and_then(|&i| self.entries.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CapabilityBinding>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Capability counts reported after a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityCounts {
    pub tools: usize,
    pub resources: usize,
    pub prompts: usize,
}

/// Individual MCP server instance
///
/// # Fields
///
/// * `name` - Unique server name used for routing
/// * `version` - Version advertised in `initialize`
/// * `description` - Used as the server's instructions
pub struct McpServerInstance {
    pub name: String,
    pub version: String,
    pub description: String,
    tools: CapabilityTable,
    resources: CapabilityTable,
    prompts: CapabilityTable,
}

impl McpServerInstance {
    /// Builds a server instance from its descriptor
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Server descriptor from the configuration document
    /// * `catalog` - Handler catalog used to resolve every capability
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - Every capability bound
    /// * `Err(BuildError)` - The first binding failure or name collision
    pub fn build(
        descriptor: &ServerDescriptor,
        catalog: &HandlerCatalog,
    ) -> Result<Self, BuildError> {
        let binder = CapabilityBinder::new(catalog);
        let mut tools = CapabilityTable::default();
        let mut resources = CapabilityTable::default();
        let mut prompts = CapabilityTable::default();

        for capability in descriptor.capabilities() {
            let binding = binder.bind(capability)?;
            match capability.kind {
                CapabilityKind::Tool => tools.insert(binding)?,
                CapabilityKind::Resource => resources.insert(binding)?,
                CapabilityKind::Prompt => prompts.insert(binding)?,
            }
        }

        let instance = Self {
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            description: descriptor.description.clone(),
            tools,
            resources,
            prompts,
        };

        let counts = instance.counts();
        tracing::info!(
            server = %instance.name,
            version = %instance.version,
            tools = counts.tools,
            resources = counts.resources,
            prompts = counts.prompts,
            "MCP server built"
        );

        Ok(instance)
    }

    pub fn tools(&self) -> &CapabilityTable {
        &self.tools
    }

    pub fn resources(&self) -> &CapabilityTable {
        &self.resources
    }

    pub fn prompts(&self) -> &CapabilityTable {
        &self.prompts
    }

    pub fn counts(&self) -> CapabilityCounts {
        CapabilityCounts {
            tools: self.tools.len(),
            resources: self.resources.len(),
            prompts: self.prompts.len(),
        }
    }
}

impl ServerHandler for McpServerInstance {
    fn get_info(&self) -> ServerInfo {
        // Capabilities with no entries are not advertised
        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability::default()),
            resources: (!self.resources.is_empty()).then(ResourcesCapability::default),
            prompts: (!self.prompts.is_empty()).then(PromptsCapability::default),
            ..Default::default()
        };

        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities,
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: if self.description.is_empty() {
                None
            } else {
                Some(self.description.clone())
            },
        }
    }
}
