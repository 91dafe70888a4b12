//! Signal handling for graceful shutdown and config reload.

use crate::config::ConfigLoader;
use hoard_core::config::{ConfigStore, WalletsConfig};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Notify;

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C).
pub async fn shutdown_signal() {
    let sigterm = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    let sigint = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = sigterm => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}

/// Spawns a task that listens for SIGHUP and reloads the configuration.
///
/// The reloaded wallet configuration is pushed into `config_store`; the
/// wallet registry picks it up from there and diffs it against the
/// current wallets. Returns a Notify that stops the task.
pub fn spawn_config_reload_handler(
    config_loader: Arc<ConfigLoader>,
    config_store: ConfigStore<WalletsConfig>,
) -> Arc<Notify> {
    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sighup) => sighup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGHUP handler, reload disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    match config_loader.reload() {
                        Ok(loaded_config) => {
                            let assets = loaded_config.wallets.desired_assets().len();
                            config_store.update(loaded_config.wallets);
                            tracing::info!(assets, "Configuration reloaded successfully");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload configuration");
                        }
                    }
                }
                _ = shutdown_notify_clone.notified() => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    });

    shutdown_notify
}
