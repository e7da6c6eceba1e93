pub mod app;
pub mod document;

pub use app::{AppConfig, SettingsError};
pub use document::{
    load, load_from_path, CapabilityDescriptor, CapabilityKind, ConfigDocument, ConfigError,
    ConfigParseError, ConfigShapeError, DeclaredType, GlobalConfig, HandlerRef, SchemaField,
    ServerDescriptor,
};
