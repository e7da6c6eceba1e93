use dynamcp::config::{self, ConfigError, ConfigShapeError, DeclaredType};
use dynamcp::test_utils::test_helpers;
use std::path::Path;

#[tokio::test]
async fn test_load_from_path_reads_every_server() {
    let file = test_helpers::write_config_file(&test_helpers::sample_config().to_string())
        .expect("Failed to write config");

    let document = config::load_from_path(file.path()).await.unwrap();

    assert_eq!(document.global.port, 3000);
    assert_eq!(document.global.host, "127.0.0.1");
    assert_eq!(document.servers.len(), 3);

    let enabled: Vec<_> = document.enabled_servers().map(|s| s.name.as_str()).collect();
    assert_eq!(enabled, vec!["calculator", "greeter"]);
}

#[tokio::test]
async fn test_load_from_missing_path_is_io_error() {
    let result = config::load_from_path(Path::new("/nonexistent/dynamcp/config.json")).await;
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[tokio::test]
async fn test_loader_does_not_resolve_handlers() {
    // An unknown handler is a build concern, not a load concern
    let document = config::load(
        r#"{
            "global": { "port": 8080 },
            "servers": [{
                "name": "ghost",
                "enabled": true,
                "tools": [{
                    "name": "boo",
                    "handler": { "path": "handlers/missing.js", "function": "boo" },
                    "inputSchema": { "x": { "type": "mystery" } }
                }]
            }]
        }"#,
    )
    .unwrap();

    assert_eq!(document.global.port, 8080);
    assert_eq!(document.global.host, "0.0.0.0");
    let tool = &document.servers[0].tools[0];
    assert_eq!(tool.handler.source_locator, "handlers/missing.js");
    assert_eq!(tool.input_schema[0].declared_type, DeclaredType::Unknown);
}

#[tokio::test]
async fn test_wrong_entry_shape_is_shape_error() {
    let result = config::load(r#"{"global": {}, "servers": [{"name": "x", "tools": [{"name": "t"}]}]}"#);
    assert!(matches!(
        result,
        Err(ConfigError::Shape(ConfigShapeError::Invalid(_)))
    ));
}
