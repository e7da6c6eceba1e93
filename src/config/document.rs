//! Configuration document loader
//!
//! Parses the JSON configuration document into an in-memory descriptor tree.
//! Loading is purely structural: handler references are carried as opaque
//! [`HandlerRef`]s and schema maps as [`SchemaField`] lists. Nothing is
//! resolved or executed here.
//!
//! # Document Shape
//!
//! ```json
//! {
//!   "global": { "port": 3000, "host": "0.0.0.0" },
//!   "servers": [
//!     {
//!       "name": "calculator",
//!       "version": "1.0.0",
//!       "enabled": true,
//!       "tools": [
//!         {
//!           "name": "add",
//!           "handler": { "path": "handlers/calculator.js", "function": "add" },
//!           "inputSchema": { "a": { "type": "number" }, "b": { "type": "number" } }
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! # Errors
//!
//! - [`ConfigParseError`] - the document is not valid JSON
//! - [`ConfigShapeError`] - `global` or `servers` is missing, or an entry has the wrong shape
//! - [`ConfigError::DuplicateServerName`] - two servers share a name

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_VERSION: &str = "1.0.0";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ConfigParseError),

    #[error(transparent)]
    Shape(#[from] ConfigShapeError),

    #[error("Duplicate server name: {0}")]
    DuplicateServerName(String),
}

/// The document is not valid structured data
#[derive(Debug, Error)]
#[error("Configuration is not valid JSON: {0}")]
pub struct ConfigParseError(#[from] serde_json::Error);

/// The document parsed but does not have the required structure
#[derive(Debug, Error)]
pub enum ConfigShapeError {
    #[error("Configuration root must be a JSON object")]
    NotAnObject,

    #[error("Missing required top-level field: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration structure: {0}")]
    Invalid(String),
}

/// Process-wide listen settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

/// Fully parsed configuration document
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    pub global: GlobalConfig,
    pub servers: Vec<ServerDescriptor>,
}

impl ConfigDocument {
    /// Descriptors with `enabled = true`, in document order
    pub fn enabled_servers(&self) -> impl Iterator<Item = &ServerDescriptor> {
        self.servers.iter().filter(|s| s.enabled)
    }
}

#[derive(Debug, Clone)]
pub struct ServerDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
    pub enabled: bool,
    pub tools: Vec<CapabilityDescriptor>,
    pub resources: Vec<CapabilityDescriptor>,
    pub prompts: Vec<CapabilityDescriptor>,
}

impl ServerDescriptor {
    /// All capabilities in registration order: tools, resources, prompts
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.tools
            .iter()
            .chain(self.resources.iter())
            .chain(self.prompts.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
}

impl CapabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Tool => "tool",
            CapabilityKind::Resource => "resource",
            CapabilityKind::Prompt => "prompt",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityDescriptor {
    pub kind: CapabilityKind,
    pub name: String,
    pub title: String,
    pub description: String,
    pub handler: HandlerRef,
    pub input_schema: Vec<SchemaField>,
    pub output_schema: Option<Vec<SchemaField>>,
    /// Resource URI or URI template; only set for resources
    pub uri: Option<String>,
}

/// Opaque reference to an externally supplied callable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct HandlerRef {
    #[serde(rename = "path")]
    pub source_locator: String,
    #[serde(rename = "function")]
    pub entry_name: String,
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source_locator, self.entry_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub field_name: String,
    pub declared_type: DeclaredType,
    pub description: String,
}

/// Declared parameter type as written in the document
///
/// Anything that is not exactly one of the five known names, including a
/// missing `type` or a differently cased name, becomes [`DeclaredType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Unknown,
}

impl DeclaredType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "string" => DeclaredType::String,
            "number" => DeclaredType::Number,
            "boolean" => DeclaredType::Boolean,
            "array" => DeclaredType::Array,
            "object" => DeclaredType::Object,
            _ => DeclaredType::Unknown,
        }
    }
}

#[derive(Deserialize)]
struct RawDocument {
    global: GlobalConfig,
    servers: Vec<RawServer>,
}

#[derive(Deserialize)]
struct RawServer {
    name: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    tools: Vec<RawCapability>,
    #[serde(default)]
    resources: Vec<RawCapability>,
    #[serde(default)]
    prompts: Vec<RawCapability>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCapability {
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    handler: HandlerRef,
    #[serde(default)]
    input_schema: Map<String, Value>,
    #[serde(default)]
    output_schema: Option<Map<String, Value>>,
    #[serde(default)]
    uri: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Converts a loosely typed `{ field: { type, description } }` map into fields
///
/// Entries that are not objects, or lack a `type`, are kept as unknown-typed
/// fields rather than rejected.
pub fn schema_fields(map: &Map<String, Value>) -> Vec<SchemaField> {
    map.iter()
        .map(|(name, definition)| SchemaField {
            field_name: name.clone(),
            declared_type: definition
                .get("type")
                .and_then(Value::as_str)
                .map(DeclaredType::parse)
                .unwrap_or(DeclaredType::Unknown),
            description: definition
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

impl RawCapability {
    fn into_descriptor(self, kind: CapabilityKind) -> CapabilityDescriptor {
        CapabilityDescriptor {
            kind,
            name: self.name,
            title: self.title,
            description: self.description,
            handler: self.handler,
            input_schema: schema_fields(&self.input_schema),
            output_schema: self.output_schema.as_ref().map(schema_fields),
            uri: self.uri,
        }
    }
}

impl RawServer {
    fn into_descriptor(self) -> ServerDescriptor {
        ServerDescriptor {
            tools: self
                .tools
                .into_iter()
                .map(|t| t.into_descriptor(CapabilityKind::Tool))
                .collect(),
            resources: self
                .resources
                .into_iter()
                .map(|r| r.into_descriptor(CapabilityKind::Resource))
                .collect(),
            prompts: self
                .prompts
                .into_iter()
                .map(|p| p.into_descriptor(CapabilityKind::Prompt))
                .collect(),
            name: self.name,
            version: self.version,
            description: self.description,
            enabled: self.enabled,
        }
    }
}

/// Parses and structurally validates a configuration document
///
/// # Arguments
///
/// * `source` - Raw document text
///
/// # Returns
///
/// The global settings and every server descriptor, enabled or not
///
/// # Errors
///
/// * `ConfigError::Parse` - Not valid JSON
/// * `ConfigError::Shape` - Missing `global`/`servers` or malformed entries
/// * `ConfigError::DuplicateServerName` - Two servers share a name
pub fn load(source: &str) -> Result<ConfigDocument, ConfigError> {
    let value: Value = serde_json::from_str(source).map_err(ConfigParseError::from)?;

    let root = value.as_object().ok_or(ConfigShapeError::NotAnObject)?;
    for field in ["global", "servers"] {
        if !root.contains_key(field) {
            return Err(ConfigShapeError::MissingField(field).into());
        }
    }

    let raw: RawDocument = serde_json::from_value(value)
        .map_err(|e| ConfigShapeError::Invalid(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut servers = Vec::with_capacity(raw.servers.len());
    for server in raw.servers {
        if !seen.insert(server.name.clone()) {
            return Err(ConfigError::DuplicateServerName(server.name));
        }
        servers.push(server.into_descriptor());
    }

    Ok(ConfigDocument {
        global: raw.global,
        servers,
    })
}

/// Reads the document at `path` and parses it with [`load`]
pub async fn load_from_path(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let document = load(&source)?;

    tracing::info!(
        path = %path.display(),
        servers = document.servers.len(),
        "Configuration loaded"
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_applies_defaults() {
        let document = load(
            r#"{
                "global": {},
                "servers": [{
                    "name": "calc",
                    "tools": [{
                        "name": "add",
                        "handler": { "path": "handlers/calculator.js", "function": "add" },
                        "inputSchema": { "a": { "type": "Number" }, "b": {} }
                    }]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(document.global, GlobalConfig::default());
        let server = &document.servers[0];
        assert_eq!(server.version, "1.0.0");
        assert!(!server.enabled);
        assert_eq!(document.enabled_servers().count(), 0);

        let tool = &server.tools[0];
        assert_eq!(tool.kind, CapabilityKind::Tool);
        assert_eq!(tool.handler.to_string(), "handlers/calculator.js#add");
        assert_eq!(tool.input_schema[0].declared_type, DeclaredType::Unknown);
        assert_eq!(tool.input_schema[1].declared_type, DeclaredType::Unknown);
    }

    #[test]
    fn test_declared_type_names_match_exactly() {
        assert_eq!(DeclaredType::parse("number"), DeclaredType::Number);
        assert_eq!(DeclaredType::parse("object"), DeclaredType::Object);
        for raw in ["Number", "STRING", " number ", "bool", "integer", ""] {
            assert_eq!(DeclaredType::parse(raw), DeclaredType::Unknown, "{:?}", raw);
        }
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        assert!(matches!(load("{ not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_requires_top_level_fields() {
        assert!(matches!(
            load(r#"{"global": {}}"#),
            Err(ConfigError::Shape(ConfigShapeError::MissingField("servers")))
        ));
        assert!(matches!(
            load(r#"{"servers": []}"#),
            Err(ConfigError::Shape(ConfigShapeError::MissingField("global")))
        ));
        assert!(matches!(
            load("[]"),
            Err(ConfigError::Shape(ConfigShapeError::NotAnObject))
        ));
    }

    #[test]
    fn test_load_rejects_duplicate_server_names() {
        let result = load(
            r#"{"global": {}, "servers": [{"name": "a"}, {"name": "a", "enabled": true}]}"#,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateServerName(name)) if name == "a"));
    }

    #[test]
    fn test_disabled_server_resource_without_uri_loads() {
        let document = load(
            r#"{"global": {}, "servers": [{
                "name": "greeter",
                "enabled": false,
                "resources": [{
                    "name": "greeting",
                    "handler": { "path": "handlers/greeting.js", "function": "getGreeting" }
                }]
            }]}"#,
        )
        .unwrap();

        let resource = &document.servers[0].resources[0];
        assert_eq!(resource.kind, CapabilityKind::Resource);
        assert_eq!(resource.uri, None);
    }
}
