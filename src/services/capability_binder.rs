//! Capability binding
//!
//! Resolves a capability descriptor's handler reference against the
//! [`HandlerCatalog`] and attaches the translated parameter validators,
//! producing a [`CapabilityBinding`]. Binding proves the handler is
//! callable with the right convention; it never invokes it.
//!
//! A binding is all-or-nothing: if resolution, convention check, or URI
//! template parsing fails, no binding is produced.

use crate::config::document::{CapabilityDescriptor, CapabilityKind};
use crate::services::handler_catalog::{Handler, HandlerCatalog};
use crate::services::schema_translator::{translate, Validator};
use crate::services::uri_template::{UriTemplate, UriTemplateError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Cannot resolve handler {locator}#{entry} for {kind} '{capability}': {reason}")]
    HandlerResolution {
        kind: CapabilityKind,
        capability: String,
        locator: String,
        entry: String,
        reason: String,
    },

    #[error("Duplicate {kind} name '{name}'")]
    CapabilityNameCollision { kind: CapabilityKind, name: String },

    #[error("Resource '{resource}' has no uri")]
    MissingResourceUri { resource: String },

    #[error("Invalid URI template for resource '{resource}': {source}")]
    InvalidUriTemplate {
        resource: String,
        #[source]
        source: UriTemplateError,
    },
}

/// The invokable form of one capability
#[derive(Debug, Clone)]
pub struct CapabilityBinding {
    pub descriptor: CapabilityDescriptor,
    pub handler: Handler,
    pub input: Validator,
    pub output: Option<Validator>,
    pub uri_template: Option<UriTemplate>,
}

impl CapabilityBinding {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn kind(&self) -> CapabilityKind {
        self.descriptor.kind
    }
}

pub struct CapabilityBinder<'a> {
    catalog: &'a HandlerCatalog,
}

impl<'a> CapabilityBinder<'a> {
    pub fn new(catalog: &'a HandlerCatalog) -> Self {
        Self { catalog }
    }

    /// Binds one capability descriptor
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Tool, resource, or prompt descriptor
    ///
    /// # Returns
    ///
    /// A binding pairing the resolved handler with the input validator and,
    /// when `outputSchema` is declared, an output validator
    ///
    /// # Errors
    ///
    /// * `BuildError::HandlerResolution` - Source or export missing, or the
    ///   export has the wrong calling convention for this capability kind
    /// * `BuildError::InvalidUriTemplate` - Resource URI cannot be compiled
    pub fn bind(&self, descriptor: &CapabilityDescriptor) -> Result<CapabilityBinding, BuildError> {
        let handler_ref = &descriptor.handler;
        let resolution_error = |reason: String| BuildError::HandlerResolution {
            kind: descriptor.kind,
            capability: descriptor.name.clone(),
            locator: handler_ref.source_locator.clone(),
            entry: handler_ref.entry_name.clone(),
            reason,
        };

        let handler = self
            .catalog
            .resolve(handler_ref)
            .map_err(|e| resolution_error(e.to_string()))?;

        if !handler.supports(descriptor.kind) {
            return Err(resolution_error(format!(
                "export is a {} handler, not callable as a {}",
                handler.convention(),
                descriptor.kind
            )));
        }

        let uri_template = match (descriptor.kind, descriptor.uri.as_deref()) {
            (CapabilityKind::Resource, Some(uri)) if !uri.trim().is_empty() => Some(
                UriTemplate::parse(uri).map_err(|source| BuildError::InvalidUriTemplate {
                    resource: descriptor.name.clone(),
                    source,
                })?,
            ),
            (CapabilityKind::Resource, _) => {
                return Err(BuildError::MissingResourceUri {
                    resource: descriptor.name.clone(),
                })
            }
            _ => None,
        };

        tracing::debug!(
            kind = %descriptor.kind,
            capability = %descriptor.name,
            handler = %handler_ref,
            "Capability bound"
        );

        Ok(CapabilityBinding {
            descriptor: descriptor.clone(),
            handler,
            input: translate(&descriptor.input_schema),
            output: descriptor.output_schema.as_deref().map(translate),
            uri_template,
        })
    }
}
