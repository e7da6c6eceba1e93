use anyhow::{anyhow, Result};
use rand::seq::SliceRandom;
use serde_json::{Map, Value};

use super::GREETING;
use crate::services::handler_catalog::HandlerCatalog;

pub fn register(catalog: &mut HandlerCatalog) {
    catalog.register_resource(GREETING, "getGreeting", get_greeting);
}

fn greetings(name: &str) -> [String; 4] {
    [
        format!("Hello, {}! Have a great day!", name),
        format!("Hello, {}! Welcome to the dynamic MCP server!", name),
        format!("Nice to meet you, {}! What can I do for you?", name),
        format!("Greetings, {}! How can I assist you today?", name),
    ]
}

/// Resource handler for `greeting://{name}`
///
/// Returns one of several greetings for `name`, picked at random.
pub async fn get_greeting(_uri: String, params: Map<String, Value>) -> Result<Value> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Parameter 'name' must be a string"))?;

    let options = greetings(name);
    let greeting = options
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_default();

    Ok(Value::String(greeting))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_greeting_mentions_name() {
        let params = json!({"name": "Ada"}).as_object().cloned().unwrap();
        let result = get_greeting("greeting://Ada".into(), params).await.unwrap();

        let text = result.as_str().unwrap();
        assert!(text.contains("Ada"));
        assert!(greetings("Ada").iter().any(|g| g == text));
    }

    #[tokio::test]
    async fn test_greeting_requires_name() {
        assert!(get_greeting("greeting://".into(), Map::new()).await.is_err());
    }
}
