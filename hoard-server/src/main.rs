//! Hoard Server
//!
//! A headless multi-asset wallet daemon: tracks the configured assets
//! through per-asset adapters and serves their state over HTTP.

mod api;
mod backend;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use hoard_core::config::ConfigStore;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Hoard - headless multi-asset wallet daemon
#[derive(Parser, Debug)]
#[command(name = "hoard-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "HOARD_CONFIG", default_value = "./hoard-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting hoard-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.listen;
    tracing::info!("Configuration loaded from {:?}", config_loader.path());

    // Create application state
    let config_store = ConfigStore::new(loaded_config.wallets);
    let state = AppState::new(config_store.clone(), loaded_config.block_interval);

    // Run the wallet registry against the config store
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let manager_task = tokio::spawn({
        let wallets = state.wallets.clone();
        let config_watcher = config_store.subscribe();
        async move { wallets.run(shutdown_rx, config_watcher).await }
    });

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(config_loader, config_store);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the reload handler and the registry
    reload_notify.notify_one();
    shutdown_tx.send_replace(true);
    if let Err(e) = manager_task.await {
        tracing::error!("Wallet manager task failed: {}", e);
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hoard_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
