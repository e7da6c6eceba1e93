use dynamcp::{
    app::create_app,
    builtins,
    config::AppConfig,
    mcp::{ConfigWatcher, McpServerRegistry},
    AppState,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dynamcp=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = AppConfig::from_env()?;

    // Initialize MCP registry; a bad document at startup is fatal
    let registry = Arc::new(McpServerRegistry::new(builtins::catalog()));

    tracing::info!(path = %settings.config_path.display(), "Loading MCP servers into registry...");
    registry.reload_from_path(&settings.config_path).await?;

    let document = registry
        .get_config()
        .await
        .ok_or("registry published no configuration")?;
    let addr = settings.listen_addr(&document.global).await?;

    // Watch the configuration for changes
    let shutdown = CancellationToken::new();
    let watcher = if settings.hot_reload {
        Some(ConfigWatcher::spawn(
            registry.clone(),
            settings.config_path.clone(),
            shutdown.child_token(),
        )?)
    } else {
        tracing::info!("Hot reload disabled");
        None
    };

    let app = create_app(AppState::new(registry.clone()));

    tracing::info!("Server running on http://{}", addr);
    tracing::info!("MCP endpoints: POST /mcp, POST /mcp/{{server_name}}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    if let Some(watcher) = watcher {
        watcher.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
