//! Wallet registry.
//!
//! The `WalletManager` owns the (asset, adapter) pairs and publishes them as
//! immutable snapshots. A new desired asset set is diffed against the
//! current wallets: adapters for assets that stay are reused as-is, adapters
//! for new assets come from the [`AdapterFactory`], and adapters for assets
//! that go are released with the snapshot that referenced them.

use std::sync::Arc;

use hoard_sdk::objects::{Asset, Credentials};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::adapters::{Adapter, AdapterFactory};
use crate::config::{ConfigWatcher, WalletsConfig};

/// One tracked asset and its adapter.
#[derive(Clone)]
pub struct Wallet {
    pub asset: Asset,
    pub adapter: Arc<dyn Adapter>,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("asset", &self.asset)
            .field("adapter", &self.adapter.id())
            .finish()
    }
}

/// An immutable wallet list.
#[derive(Debug, Clone, Default)]
pub struct WalletSnapshot {
    /// Bumped once per published snapshot.
    pub version: u64,
    pub wallets: Arc<[Wallet]>,
}

impl WalletSnapshot {
    pub fn get(&self, code: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.asset.code == code)
    }
}

pub struct WalletManager<F> {
    factory: F,
    snapshot: watch::Sender<WalletSnapshot>,
    /// Serializes `set_desired_assets` and `clear_all`.
    lifecycle: Mutex<()>,
}

impl<F: AdapterFactory> WalletManager<F> {
    pub fn new(factory: F) -> Self {
        let (snapshot, _) = watch::channel(WalletSnapshot::default());
        Self {
            factory,
            snapshot,
            lifecycle: Mutex::new(()),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Track exactly `assets`, in this order.
    ///
    /// Publishes one snapshot, then starts the adapters created by this
    /// call. Assets the factory cannot serve are left out.
    pub async fn set_desired_assets(&self, credentials: &Credentials, assets: &[Asset]) {
        let _guard = self.lifecycle.lock().await;
        let current = self.wallets();

        let mut next: Vec<Wallet> = Vec::with_capacity(assets.len());
        let mut created: Vec<Arc<dyn Adapter>> = Vec::new();

        for asset in assets {
            if next.iter().any(|w| &w.asset == asset) {
                debug!(%asset, "Ignoring duplicate asset");
                continue;
            }

            if let Some(existing) = current.iter().find(|w| &w.asset == asset) {
                next.push(existing.clone());
                continue;
            }

            match self.factory.adapter(asset, credentials) {
                Ok(adapter) => {
                    info!(%asset, id = %adapter.id(), "Created adapter");
                    created.push(Arc::clone(&adapter));
                    next.push(Wallet {
                        asset: asset.clone(),
                        adapter,
                    });
                }
                Err(e) => {
                    warn!(%asset, error = %e, "Failed to create adapter, asset dropped");
                }
            }
        }

        for removed in current.iter().filter(|w| !next.iter().any(|n| n.asset == w.asset)) {
            info!(asset = %removed.asset, id = %removed.adapter.id(), "Releasing adapter");
        }

        let version = self.publish(next);
        info!(version, created = created.len(), "Wallet set updated");

        for adapter in created {
            adapter.start().await;
        }
    }

    /// Clear every tracked adapter's engine data and forget all wallets.
    pub async fn clear_all(&self) {
        let _guard = self.lifecycle.lock().await;

        for wallet in self.wallets().iter() {
            if let Err(e) = wallet.adapter.clear(&[]).await {
                warn!(asset = %wallet.asset, error = %e, "Failed to clear adapter");
            }
        }

        let version = self.publish(Vec::new());
        info!(version, "All wallets cleared");
    }

    /// Refresh every tracked adapter.
    pub async fn refresh_all(&self) {
        let wallets = self.wallets();
        for wallet in wallets.iter() {
            wallet.adapter.refresh().await;
        }
    }

    /// The current wallet list.
    pub fn wallets(&self) -> Arc<[Wallet]> {
        Arc::clone(&self.snapshot.borrow().wallets)
    }

    pub fn wallet(&self, code: &str) -> Option<Wallet> {
        self.snapshot.borrow().get(code).cloned()
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.borrow().version
    }

    /// Follow the config store behind `config_watcher` until shutdown.
    ///
    /// Applies the current config right away and again after every
    /// update. Exits on shutdown or once every store handle is dropped;
    /// every remaining adapter is stopped on exit.
    pub async fn run(
        &self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut config_watcher: ConfigWatcher<WalletsConfig>,
    ) {
        self.apply_config(&config_watcher.current()).await;
        info!(wallets = self.wallets().len(), "WalletManager started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("WalletManager received shutdown signal");
                        break;
                    }
                }

                changed = config_watcher.changed() => match changed {
                    Ok(config) => {
                        self.apply_config(&config).await;
                        info!(wallets = self.wallets().len(), "WalletManager reconciled config");
                    }
                    Err(_) => {
                        info!("Config store closed");
                        break;
                    }
                },
            }
        }

        for wallet in self.wallets().iter() {
            wallet.adapter.stop();
        }

        info!("WalletManager shutdown complete");
    }

    async fn apply_config(&self, config: &WalletsConfig) {
        self.set_desired_assets(&config.credentials, &config.desired_assets())
            .await;
    }

    fn publish(&self, wallets: Vec<Wallet>) -> u64 {
        let version = self.version() + 1;
        self.snapshot.send_replace(WalletSnapshot {
            version,
            wallets: wallets.into(),
        });
        version
    }
}
