use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::schema_translator::ValidationError;

/// Per-call failures raised at the handler executor boundary
///
/// None of these terminate the hosting server instance. They are converted
/// into protocol-level responses via the `From<ExecutionError>` implementation
/// for `rmcp::ErrorData`, or, for tool handler failures, into an error
/// `CallToolResult`.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Parameters failed the capability's input schema
    ///
    /// The handler was not invoked. Maps to MCP error code INVALID_PARAMS.
    #[error("Parameter validation failed for '{capability}': {source}")]
    ParameterValidation {
        capability: String,
        #[source]
        source: ValidationError,
    },

    /// The handler returned an error
    ///
    /// Isolated to this one invocation. Maps to MCP error code INTERNAL_ERROR.
    #[error("Handler for '{capability}' failed: {message}")]
    HandlerExecution { capability: String, message: String },

    /// The handler's result did not satisfy the declared output schema
    ///
    /// Maps to MCP error code INTERNAL_ERROR.
    #[error("Result of '{capability}' does not match its output schema: {source}")]
    OutputValidation {
        capability: String,
        #[source]
        source: ValidationError,
    },
}

impl ExecutionError {
    pub fn is_handler_failure(&self) -> bool {
        !matches!(self, ExecutionError::ParameterValidation { .. })
    }
}

/// Convert ExecutionError to rmcp::ErrorData for MCP protocol responses
///
/// | ExecutionError Variant | MCP Error Code  |
/// |------------------------|-----------------|
/// | ParameterValidation    | INVALID_PARAMS  |
/// | HandlerExecution       | INTERNAL_ERROR  |
/// | OutputValidation       | INTERNAL_ERROR  |
impl From<ExecutionError> for rmcp::ErrorData {
    fn from(err: ExecutionError) -> Self {
        use rmcp::model::{ErrorCode, ErrorData};

        let code = match err {
            ExecutionError::ParameterValidation { .. } => ErrorCode::INVALID_PARAMS,
            ExecutionError::HandlerExecution { .. } | ExecutionError::OutputValidation { .. } => {
                ErrorCode::INTERNAL_ERROR
            }
        };

        ErrorData {
            code,
            message: err.to_string().into(),
            data: None,
        }
    }
}

/// The inbound payload cannot be carried by a single exchange
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Payload must be a single JSON-RPC message object")]
    NotAMessage,

    #[error("Unsupported JSON-RPC version: {0}")]
    UnsupportedVersion(String),
}

/// Routing failures for one inbound exchange
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("No MCP servers available")]
    NoServersAvailable,

    #[error("MCP server '{0}' not found")]
    ServerNotFound(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = match self {
            RouteError::NoServersAvailable => StatusCode::SERVICE_UNAVAILABLE,
            RouteError::ServerNotFound(_) => StatusCode::NOT_FOUND,
            RouteError::Transport(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
