//! MCP protocol dispatch for a server instance
//!
//! Handles one JSON-RPC message against one [`McpServerInstance`] and builds
//! the JSON-RPC response.
//!
//! # Supported Methods
//!
//! * `initialize` - Server info and capabilities
//! * `ping` - Empty result
//! * `tools/list`, `tools/call`
//! * `resources/list`, `resources/templates/list`, `resources/read`
//! * `prompts/list`, `prompts/get`
//!
//! Messages without an `id` are notifications: they are processed and
//! produce no response.

use crate::mcp::instance::McpServerInstance;
use crate::services::handler_executor::HandlerExecutor;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{ErrorCode, ErrorData};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn error_data(code: ErrorCode, message: impl Into<String>) -> ErrorData {
    ErrorData {
        code,
        message: message.into().into(),
        data: None,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ErrorData> {
    serde_json::to_value(value).map_err(|e| {
        error_data(
            ErrorCode::INTERNAL_ERROR,
            format!("Failed to serialize result: {}", e),
        )
    })
}

fn required_str<'a>(params: &'a Value, field: &str) -> Result<&'a str, ErrorData> {
    params.get(field).and_then(Value::as_str).ok_or_else(|| {
        error_data(
            ErrorCode::INVALID_PARAMS,
            format!("Missing '{}' parameter", field),
        )
    })
}

fn arguments(params: &Value) -> Option<Map<String, Value>> {
    params.get("arguments").and_then(Value::as_object).cloned()
}

fn non_empty(text: &str) -> Option<&str> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

impl McpServerInstance {
    /// Handle a single JSON-RPC message
    ///
    /// # Arguments
    ///
    /// * `request` - JSON-RPC message object
    ///
    /// # Returns
    ///
    /// * `Some(Value)` - JSON-RPC response with `result` or `error`
    /// * `None` - The message was a notification
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use dynamcp::mcp::McpServerInstance;
    /// # use serde_json::json;
    /// # async fn example(instance: &McpServerInstance) {
    /// let request = json!({
    ///     "jsonrpc": "2.0",
    ///     "id": 1,
    ///     "method": "tools/call",
    ///     "params": { "name": "add", "arguments": { "a": 2, "b": 3 } }
    /// });
    /// let response = instance.handle_request(request).await;
    /// # }
    /// ```
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let request_id = request.get("id").cloned();
        let params = request.get("params").cloned().unwrap_or(Value::Null);

        let result = match request.get("method").and_then(Value::as_str) {
            Some(method) => self.dispatch(method, &params).await,
            None => Err(error_data(
                ErrorCode::INVALID_REQUEST,
                "Missing method field",
            )),
        };

        let request_id = match request_id {
            Some(id) if !id.is_null() => id,
            _ => {
                if let Err(e) = &result {
                    tracing::debug!(server = %self.name, error = %e.message, "Notification failed");
                }
                return None;
            }
        };

        Some(match result {
            Ok(res) => json!({
                "jsonrpc": "2.0",
                "id": request_id,
                "result": res,
            }),
            Err(e) => json!({
                "jsonrpc": "2.0",
                "id": request_id,
                "error": e,
            }),
        })
    }

    async fn dispatch(&self, method: &str, params: &Value) -> Result<Value, ErrorData> {
        match method {
            "initialize" => to_json(&self.get_info()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.list_tools() })),
            "tools/call" => self.call_tool(params).await,
            "resources/list" => Ok(json!({ "resources": self.list_resources() })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": self.list_resource_templates() }))
            }
            "resources/read" => self.read_resource(params).await,
            "prompts/list" => Ok(json!({ "prompts": self.list_prompts() })),
            "prompts/get" => self.get_prompt(params).await,
            m if m.starts_with("notifications/") => Ok(Value::Null),
            _ => Err(error_data(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Method '{}' not supported", method),
            )),
        }
    }

    fn list_tools(&self) -> Vec<rmcp::model::Tool> {
        self.tools()
            .iter()
            .map(|binding| {
                let descriptor = &binding.descriptor;
                rmcp::model::Tool {
                    name: descriptor.name.clone().into(),
                    title: non_empty(&descriptor.title).map(|t| t.to_string().into()),
                    description: non_empty(&descriptor.description).map(|d| d.to_string().into()),
                    input_schema: Arc::new(schema_object(binding.input.to_json_schema())),
                    output_schema: binding
                        .output
                        .as_ref()
                        .map(|output| Arc::new(schema_object(output.to_json_schema()))),
                    annotations: None,
                    icons: None,
                }
            })
            .collect()
    }

    async fn call_tool(&self, params: &Value) -> Result<Value, ErrorData> {
        let name = required_str(params, "name")?;
        let binding = self.tools().get(name).ok_or_else(|| {
            error_data(ErrorCode::INVALID_PARAMS, format!("Tool {} not found", name))
        })?;

        let call_result = HandlerExecutor::call_tool(binding, arguments(params)).await?;
        to_json(&call_result)
    }

    fn list_resources(&self) -> Vec<Value> {
        self.resources()
            .iter()
            .filter(|binding| {
                binding
                    .uri_template
                    .as_ref()
                    .is_some_and(|template| template.is_concrete())
            })
            .map(|binding| {
                resource_entry(
                    "uri",
                    binding.descriptor.uri.as_deref().unwrap_or_default(),
                    &binding.descriptor,
                )
            })
            .collect()
    }

    fn list_resource_templates(&self) -> Vec<Value> {
        self.resources()
            .iter()
            .filter(|binding| {
                binding
                    .uri_template
                    .as_ref()
                    .is_some_and(|template| !template.is_concrete())
            })
            .map(|binding| {
                resource_entry(
                    "uriTemplate",
                    binding.descriptor.uri.as_deref().unwrap_or_default(),
                    &binding.descriptor,
                )
            })
            .collect()
    }

    async fn read_resource(&self, params: &Value) -> Result<Value, ErrorData> {
        let uri = required_str(params, "uri")?;

        let matched = self.resources().iter().find_map(|binding| {
            binding
                .uri_template
                .as_ref()
                .and_then(|template| template.match_uri(uri))
                .map(|variables| (binding, variables))
        });

        let (binding, variables) = matched.ok_or_else(|| {
            error_data(
                ErrorCode::RESOURCE_NOT_FOUND,
                format!("Resource {} not found", uri),
            )
        })?;

        Ok(HandlerExecutor::read_resource(binding, uri, variables).await?)
    }

    fn list_prompts(&self) -> Vec<Value> {
        self.prompts()
            .iter()
            .map(|binding| {
                let descriptor = &binding.descriptor;
                let mut entry = json!({
                    "name": descriptor.name,
                    "arguments": binding.input.to_prompt_arguments(),
                });
                if let Some(title) = non_empty(&descriptor.title) {
                    entry["title"] = json!(title);
                }
                if let Some(description) = non_empty(&descriptor.description) {
                    entry["description"] = json!(description);
                }
                entry
            })
            .collect()
    }

    async fn get_prompt(&self, params: &Value) -> Result<Value, ErrorData> {
        let name = required_str(params, "name")?;
        let binding = self.prompts().get(name).ok_or_else(|| {
            error_data(
                ErrorCode::INVALID_PARAMS,
                format!("Prompt {} not found", name),
            )
        })?;

        Ok(HandlerExecutor::get_prompt(binding, arguments(params)).await?)
    }
}

fn schema_object(schema: Value) -> Map<String, Value> {
    match schema {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn resource_entry(
    uri_key: &str,
    uri: &str,
    descriptor: &crate::config::document::CapabilityDescriptor,
) -> Value {
    let mut entry = json!({ uri_key: uri, "name": descriptor.name });
    if let Some(title) = non_empty(&descriptor.title) {
        entry["title"] = json!(title);
    }
    if let Some(description) = non_empty(&descriptor.description) {
        entry["description"] = json!(description);
    }
    entry
}
