use dynamcp::mcp::ConfigWatcher;
use dynamcp::test_utils::test_helpers;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_file_change_triggers_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = test_helpers::sample_config();
    std::fs::write(&path, config.to_string()).unwrap();

    let (registry, _) = test_helpers::test_registry();
    registry.reload_from_path(&path).await.unwrap();

    let watcher = ConfigWatcher::spawn_with_debounce(
        registry.clone(),
        path.clone(),
        CancellationToken::new(),
        Duration::from_millis(50),
    )
    .unwrap();

    let updated = test_helpers::with_enabled(config, "greeter", false);
    std::fs::write(&path, updated.to_string()).unwrap();

    let mut reloaded = false;
    for _ in 0..100 {
        if registry.get_server("greeter").await.is_none() {
            reloaded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(reloaded, "Watcher should have reloaded the registry");
    assert_eq!(
        registry.get_all_server_names().await,
        vec!["calculator".to_string()]
    );

    watcher.shutdown().await;
}

#[tokio::test]
async fn test_broken_edit_keeps_serving() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, test_helpers::sample_config().to_string()).unwrap();

    let (registry, _) = test_helpers::test_registry();
    registry.reload_from_path(&path).await.unwrap();

    let watcher = ConfigWatcher::spawn_with_debounce(
        registry.clone(),
        path.clone(),
        CancellationToken::new(),
        Duration::from_millis(50),
    )
    .unwrap();

    std::fs::write(&path, "{ not json").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let status = registry.status().await;
    assert_eq!(status.generation, 1);
    assert_eq!(status.servers, vec!["calculator", "greeter"]);

    watcher.shutdown().await;
}
