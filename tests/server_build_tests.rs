use dynamcp::config::document::{CapabilityKind, ServerDescriptor};
use dynamcp::mcp::McpServerInstance;
use dynamcp::services::capability_binder::{BuildError, CapabilityBinder};
use dynamcp::test_utils::test_helpers;
use serde_json::{json, Value};

fn server_descriptor(server: Value) -> ServerDescriptor {
    let config = json!({ "global": {}, "servers": [server] });
    test_helpers::parse_config(&config)
        .expect("Failed to parse config")
        .servers
        .remove(0)
}

#[test]
fn test_build_counts_capabilities() {
    let (catalog, _) = test_helpers::test_catalog();
    let document = test_helpers::parse_config(&test_helpers::sample_config()).unwrap();

    let calculator = McpServerInstance::build(&document.servers[0], &catalog).unwrap();
    let counts = calculator.counts();
    assert_eq!(counts.tools, 5);
    assert_eq!(counts.resources, 0);
    assert_eq!(counts.prompts, 1);
    assert_eq!(calculator.version, "1.2.0");

    let greeter = McpServerInstance::build(&document.servers[2], &catalog).unwrap();
    assert_eq!(greeter.counts().resources, 1);
    assert!(greeter.resources().get("greeting").is_some());
}

#[test]
fn test_locator_variants_resolve_to_same_module() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "calc",
        "tools": [
            { "name": "a", "handler": { "path": "handlers/calculator.js", "function": "add" } },
            { "name": "b", "handler": { "path": "./handlers/calculator", "function": "add" } },
            { "name": "c", "handler": { "path": " handlers/calculator ", "function": "add" } }
        ]
    }));

    let instance = McpServerInstance::build(&descriptor, &catalog).unwrap();
    assert_eq!(instance.tools().len(), 3);
}

#[test]
fn test_unresolvable_handler_fails_whole_server() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "calc",
        "tools": [
            { "name": "add", "handler": { "path": "handlers/calculator.js", "function": "add" } },
            { "name": "modulo", "handler": { "path": "handlers/calculator.js", "function": "modulo" } }
        ]
    }));

    let err = McpServerInstance::build(&descriptor, &catalog).err().unwrap();
    match err {
        BuildError::HandlerResolution {
            kind,
            capability,
            entry,
            ..
        } => {
            assert_eq!(kind, CapabilityKind::Tool);
            assert_eq!(capability, "modulo");
            assert_eq!(entry, "modulo");
        }
        other => panic!("Unexpected error: {}", other),
    }
}

#[test]
fn test_missing_source_is_resolution_error() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "x",
        "tools": [{ "name": "t", "handler": { "path": "handlers/nowhere.js", "function": "t" } }]
    }));

    let binder = CapabilityBinder::new(&catalog);
    let err = binder.bind(&descriptor.tools[0]).unwrap_err();
    assert!(err.to_string().contains("handlers/nowhere.js"));
}

#[test]
fn test_wrong_calling_convention_is_resolution_error() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "mixed",
        "tools": [{
            "name": "greet",
            "handler": { "path": "handlers/greeting.js", "function": "getGreeting" }
        }]
    }));

    let err = McpServerInstance::build(&descriptor, &catalog).err().unwrap();
    assert!(matches!(err, BuildError::HandlerResolution { .. }));
}

#[test]
fn test_duplicate_capability_name_is_collision() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "calc",
        "tools": [
            { "name": "op", "handler": { "path": "handlers/calculator.js", "function": "add" } },
            { "name": "op", "handler": { "path": "handlers/calculator.js", "function": "subtract" } }
        ]
    }));

    let err = McpServerInstance::build(&descriptor, &catalog).err().unwrap();
    assert!(matches!(
        err,
        BuildError::CapabilityNameCollision { kind: CapabilityKind::Tool, ref name } if name == "op"
    ));
}

#[test]
fn test_same_name_across_kinds_is_allowed() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "both",
        "tools": [
            { "name": "explain", "handler": { "path": "handlers/calculator.js", "function": "add" } }
        ],
        "prompts": [
            { "name": "explain", "handler": { "path": test_helpers::TEST_HANDLERS, "function": "explain" } }
        ]
    }));

    assert!(McpServerInstance::build(&descriptor, &catalog).is_ok());
}

#[test]
fn test_invalid_uri_template_fails_build() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "greeter",
        "resources": [{
            "name": "greeting",
            "uri": "greeting://{name}/{name}",
            "handler": { "path": "handlers/greeting.js", "function": "getGreeting" }
        }]
    }));

    let err = McpServerInstance::build(&descriptor, &catalog).err().unwrap();
    assert!(matches!(err, BuildError::InvalidUriTemplate { .. }));
}

#[test]
fn test_resource_without_uri_fails_build() {
    let (catalog, _) = test_helpers::test_catalog();
    let descriptor = server_descriptor(json!({
        "name": "greeter",
        "enabled": true,
        "resources": [{
            "name": "greeting",
            "handler": { "path": "handlers/greeting.js", "function": "getGreeting" }
        }]
    }));

    let err = McpServerInstance::build(&descriptor, &catalog).err().unwrap();
    assert!(matches!(err, BuildError::MissingResourceUri { ref resource } if resource == "greeting"));
}
