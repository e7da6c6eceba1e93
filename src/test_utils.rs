pub mod test_helpers {
    use crate::builtins;
    use crate::config::document::{self, ConfigDocument, ConfigError};
    use crate::mcp::registry::{McpServerRegistry, SharedRegistry};
    use crate::services::handler_catalog::HandlerCatalog;
    use serde_json::{json, Map, Value};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    /// Locator of the test-only handler module
    pub const TEST_HANDLERS: &str = "handlers/testing";

    /// Counts handler invocations
    #[derive(Debug, Clone, Default)]
    pub struct CallCounter(Arc<AtomicUsize>);

    impl CallCounter {
        pub fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Built-in handlers plus `handlers/testing` exports
    ///
    /// * `countedAdd` - Same as `calculator#add`, counted by the returned counter
    /// * `wait` - Sleeps `ms` milliseconds, then returns `{"waited": ms}`
    /// * `fail` - Always fails
    /// * `failResource` - Resource handler that always fails
    /// * `explain` - Prompt handler returning a one-line explanation of `topic`
    pub fn test_catalog() -> (HandlerCatalog, CallCounter) {
        let counter = CallCounter::default();
        let mut catalog = builtins::catalog();

        let calls = counter.clone();
        catalog
            .register_params(TEST_HANDLERS, "countedAdd", move |params: Map<String, Value>| {
                calls.hit();
                builtins::calculator::add(params)
            })
            .register_params(TEST_HANDLERS, "wait", wait)
            .register_params(TEST_HANDLERS, "fail", fail)
            .register_params(TEST_HANDLERS, "explain", explain)
            .register_resource(TEST_HANDLERS, "failResource", fail_resource);

        (catalog, counter)
    }

    async fn wait(params: Map<String, Value>) -> anyhow::Result<Value> {
        let ms = params.get("ms").and_then(Value::as_u64).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(json!({ "waited": ms }))
    }

    async fn fail(_params: Map<String, Value>) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("handler exploded"))
    }

    async fn fail_resource(uri: String, _params: Map<String, Value>) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("cannot read {}", uri))
    }

    async fn explain(params: Map<String, Value>) -> anyhow::Result<Value> {
        let topic = params
            .get("topic")
            .and_then(Value::as_str)
            .unwrap_or("nothing");
        Ok(Value::String(format!("Explain {} in one sentence.", topic)))
    }

    /// A registry over [`test_catalog`] with nothing loaded yet
    pub fn test_registry() -> (SharedRegistry, CallCounter) {
        let (catalog, counter) = test_catalog();
        (Arc::new(McpServerRegistry::new(catalog)), counter)
    }

    fn tool(name: &str, locator: &str, entry: &str, schema: Value) -> Value {
        json!({
            "name": name,
            "title": name,
            "description": format!("{} tool", name),
            "handler": { "path": locator, "function": entry },
            "inputSchema": schema,
        })
    }

    fn two_numbers() -> Value {
        json!({
            "a": { "type": "number", "description": "First number" },
            "b": { "type": "number", "description": "Second number" },
        })
    }

    /// Sample document: `calculator` and `greeter` enabled, `engineering` disabled
    pub fn sample_config() -> Value {
        json!({
            "global": { "port": 3000, "host": "127.0.0.1" },
            "servers": [
                {
                    "name": "calculator",
                    "version": "1.2.0",
                    "description": "Basic arithmetic",
                    "enabled": true,
                    "tools": [
                        tool("add", "handlers/calculator.js", "add", two_numbers()),
                        tool("divide", "./handlers/calculator", "divide", two_numbers()),
                        tool("countedAdd", TEST_HANDLERS, "countedAdd", two_numbers()),
                        tool("wait", TEST_HANDLERS, "wait", json!({ "ms": { "type": "number" } })),
                        tool("fail", TEST_HANDLERS, "fail", json!({})),
                    ],
                    "prompts": [
                        {
                            "name": "explain",
                            "description": "Explain a topic",
                            "handler": { "path": TEST_HANDLERS, "function": "explain" },
                            "inputSchema": { "topic": { "type": "string", "description": "Topic" } }
                        }
                    ]
                },
                {
                    "name": "engineering",
                    "enabled": false,
                    "tools": [
                        tool("sqrt", "handlers/engineering.js", "sqrt",
                             json!({ "value": { "type": "number" } })),
                        tool("factorial", "handlers/engineering.js", "factorial",
                             json!({ "n": { "type": "number" } })),
                    ]
                },
                {
                    "name": "greeter",
                    "description": "Greets people",
                    "enabled": true,
                    "resources": [
                        {
                            "name": "greeting",
                            "uri": "greeting://{name}",
                            "description": "Personal greeting",
                            "handler": { "path": "handlers/greeting.js", "function": "getGreeting" },
                            "inputSchema": { "name": { "type": "string" } }
                        }
                    ]
                }
            ]
        })
    }

    /// Returns `config` with the `enabled` flag of `server` replaced
    pub fn with_enabled(mut config: Value, server: &str, enabled: bool) -> Value {
        if let Some(servers) = config["servers"].as_array_mut() {
            for entry in servers.iter_mut().filter(|s| s["name"] == server) {
                entry["enabled"] = json!(enabled);
            }
        }
        config
    }

    pub fn parse_config(config: &Value) -> Result<ConfigDocument, ConfigError> {
        document::load(&config.to_string())
    }

    /// Writes `contents` to a temporary file that lives as long as the handle
    pub fn write_config_file(contents: &str) -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// A JSON-RPC request envelope
    pub fn rpc(id: u64, method: &str, params: Value) -> Value {
        json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params })
    }

    /// A `tools/call` request envelope
    pub fn tool_call(id: u64, tool: &str, arguments: Value) -> Value {
        rpc(id, "tools/call", json!({ "name": tool, "arguments": arguments }))
    }
}
