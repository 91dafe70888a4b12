//! Application state shared across all request handlers.

use crate::backend::SimulatedProvider;
use hoard_core::adapters::LightClientAdapterFactory;
use hoard_core::config::{ConfigStore, WalletsConfig};
use hoard_core::wallets::WalletManager;
use std::sync::Arc;
use std::time::Duration;

/// The wallet registry as wired up by the daemon.
pub type Wallets = WalletManager<LightClientAdapterFactory<SimulatedProvider>>;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// The wallet registry.
    pub wallets: Arc<Wallets>,
    /// Desired wallet configuration (replaced on SIGHUP).
    pub config: ConfigStore<WalletsConfig>,
}

impl AppState {
    /// Create the registry on top of `config`.
    pub fn new(config: ConfigStore<WalletsConfig>, block_interval: Option<Duration>) -> Self {
        let provider = SimulatedProvider::new(config.clone(), block_interval);
        Self {
            wallets: Arc::new(WalletManager::new(LightClientAdapterFactory::new(provider))),
            config,
        }
    }
}
