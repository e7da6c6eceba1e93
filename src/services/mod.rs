pub mod capability_binder;
pub mod handler_catalog;
pub mod handler_executor;
pub mod schema_translator;
pub mod uri_template;

pub use capability_binder::{BuildError, CapabilityBinder, CapabilityBinding};
pub use handler_catalog::{Handler, HandlerCatalog, ParamsHandler, ResourceHandler};
pub use handler_executor::HandlerExecutor;
pub use schema_translator::{translate, ValidationError, Validator};
pub use uri_template::UriTemplate;
