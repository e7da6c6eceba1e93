//! Handler execution for bound capabilities
//!
//! The executor is the per-request error boundary. Within one call the order
//! is fixed:
//!
//! ```text
//! ┌─────────────────────┐
//! │  Input validation   │──── fails ──> ParameterValidation (handler not called)
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  Handler invocation │──── fails ──> HandlerExecution (logged with params)
//! │  (timed)            │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  Output validation  │──── fails ──> OutputValidation
//! │  (if declared)      │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │  Response envelope  │  CallToolResult / resource contents / prompt messages
//! └─────────────────────┘
//! ```

use crate::error::ExecutionError;
use crate::services::capability_binder::CapabilityBinding;
use rmcp::model::{CallToolResult, Content};
use serde_json::{json, Map, Value};
use std::time::Instant;

pub struct HandlerExecutor;

impl HandlerExecutor {
    /// Validates `params`, invokes the bound handler, and returns its raw result
    ///
    /// # Arguments
    ///
    /// * `binding` - The capability to invoke
    /// * `target` - Requested URI for resources; ignored for tools and prompts
    /// * `params` - Parameter record supplied by the caller
    ///
    /// # Errors
    ///
    /// * `ExecutionError::ParameterValidation` - Input schema rejected `params`
    /// * `ExecutionError::HandlerExecution` - The handler returned an error
    /// * `ExecutionError::OutputValidation` - Result violates the output schema
    pub async fn execute(
        binding: &CapabilityBinding,
        target: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ExecutionError> {
        let capability = binding.name();

        let validated =
            binding
                .input
                .validate(params)
                .map_err(|source| ExecutionError::ParameterValidation {
                    capability: capability.to_string(),
                    source,
                })?;

        // Keep a copy for the failure log; the handler takes ownership
        let logged_params = Value::Object(validated.clone());

        let started_at = Instant::now();
        let outcome = binding.handler.invoke(target, validated).await;
        let elapsed_ms = started_at.elapsed().as_millis();

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    kind = %binding.kind(),
                    capability = %capability,
                    params = %logged_params,
                    elapsed_ms = elapsed_ms as u64,
                    error = %e,
                    "Capability execution failed"
                );
                return Err(ExecutionError::HandlerExecution {
                    capability: capability.to_string(),
                    message: format!("{:#}", e),
                });
            }
        };

        tracing::debug!(
            kind = %binding.kind(),
            capability = %capability,
            elapsed_ms = elapsed_ms as u64,
            "Capability executed"
        );

        if let Some(output) = &binding.output {
            output
                .validate_value(&result)
                .map_err(|source| ExecutionError::OutputValidation {
                    capability: capability.to_string(),
                    source,
                })?;
        }

        Ok(result)
    }

    /// Executes a tool and wraps the result in the MCP tool envelope
    ///
    /// Handler and output-schema failures are reported inside the result
    /// (`isError: true`) so the client sees a tool-level failure rather than
    /// a protocol fault. Parameter validation failures are returned as `Err`.
    pub async fn call_tool(
        binding: &CapabilityBinding,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, ExecutionError> {
        match Self::execute(binding, "", arguments.unwrap_or_default()).await {
            Ok(result) => Ok(success_envelope(result)),
            Err(e) if e.is_handler_failure() => {
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
            Err(e) => Err(e),
        }
    }

    /// Reads a resource and wraps the result in `resources/read` form
    pub async fn read_resource(
        binding: &CapabilityBinding,
        uri: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ExecutionError> {
        let result = Self::execute(binding, uri, params).await?;

        Ok(json!({
            "contents": [{
                "uri": uri,
                "text": value_to_text(&result),
            }]
        }))
    }

    /// Renders a prompt and wraps the result in `prompts/get` form
    ///
    /// A string result becomes one user text message; an object carrying
    /// `messages` is passed through.
    pub async fn get_prompt(
        binding: &CapabilityBinding,
        arguments: Option<Map<String, Value>>,
    ) -> Result<Value, ExecutionError> {
        let result = Self::execute(binding, "", arguments.unwrap_or_default()).await?;

        let messages = match result.get("messages") {
            Some(messages) if messages.is_array() => messages.clone(),
            _ => json!([{
                "role": "user",
                "content": { "type": "text", "text": value_to_text(&result) },
            }]),
        };

        let mut envelope = json!({ "messages": messages });
        if !binding.descriptor.description.is_empty() {
            envelope["description"] = json!(binding.descriptor.description);
        }
        Ok(envelope)
    }
}

fn success_envelope(result: Value) -> CallToolResult {
    let mut envelope = CallToolResult::success(vec![Content::text(result.to_string())]);
    envelope.structured_content = Some(result);
    envelope
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
