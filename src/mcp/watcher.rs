//! Configuration file watcher
//!
//! Watches the directory holding the configuration document and reloads the
//! registry after changes settle. The directory is watched rather than the
//! file so editors that replace the file on save are still observed.

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::mcp::registry::SharedRegistry;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("Failed to watch {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Handle to a running watcher task
pub struct ConfigWatcher {
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ConfigWatcher {
    /// Starts watching `config_path` with the default debounce
    pub fn spawn(
        registry: SharedRegistry,
        config_path: PathBuf,
        cancel: CancellationToken,
    ) -> Result<Self, WatchError> {
        Self::spawn_with_debounce(registry, config_path, cancel, DEFAULT_DEBOUNCE)
    }

    pub fn spawn_with_debounce(
        registry: SharedRegistry,
        config_path: PathBuf,
        cancel: CancellationToken,
        debounce: Duration,
    ) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    let relevant = matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    ) && event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Configuration watch error"),
            })
            .map_err(|source| WatchError::Notify {
                path: config_path.clone(),
                source,
            })?;

        let watch_dir = watch_directory(&config_path);
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Notify {
                path: watch_dir.clone(),
                source,
            })?;

        tracing::info!(path = %config_path.display(), "Watching configuration for changes");

        let task = tokio::spawn(run(
            watcher,
            rx,
            registry,
            config_path,
            cancel.clone(),
            debounce,
        ));

        Ok(Self { task, cancel })
    }

    /// Stops the watcher and waits for its task to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

fn watch_directory(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn run(
    _watcher: RecommendedWatcher,
    mut rx: mpsc::UnboundedReceiver<()>,
    registry: SharedRegistry,
    config_path: PathBuf,
    cancel: CancellationToken,
    debounce: Duration,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => {
                if event.is_none() {
                    break;
                }
            }
        }

        // Collapse a burst of events into one reload
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(debounce) => break,
                more = rx.recv() => {
                    if more.is_none() {
                        break;
                    }
                }
            }
        }

        tracing::info!(path = %config_path.display(), "Configuration changed, reloading");
        match registry.reload_from_path(&config_path).await {
            Ok(summary) => tracing::info!(
                generation = summary.generation,
                servers = ?summary.servers,
                "Reload complete"
            ),
            Err(e) => tracing::error!(error = %e, "Reload failed, keeping previous servers"),
        }
    }

    tracing::debug!("Configuration watcher stopped");
}
