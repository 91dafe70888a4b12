//! Tracked-asset configuration.

use hoard_sdk::objects::{Asset, Credentials};
use rust_decimal::Decimal;

/// Confirmations after which a record counts as final, unless configured.
pub const DEFAULT_CONFIRMATIONS_THRESHOLD: u32 = 10;

/// Per-asset parameters the adapter needs beyond the asset identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetParams {
    /// Flat network fee, in display units.
    pub fee: Decimal,
    /// Confirmations after which a record counts as final.
    pub confirmations_threshold: u32,
}

impl Default for AssetParams {
    fn default() -> Self {
        Self {
            fee: Decimal::ZERO,
            confirmations_threshold: DEFAULT_CONFIRMATIONS_THRESHOLD,
        }
    }
}

/// One configured asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetConfig {
    pub asset: Asset,
    pub params: AssetParams,
    /// Disabled assets stay in the file but are not tracked.
    pub enabled: bool,
}

/// The desired wallet set: who we are and which assets to track.
#[derive(Debug, Clone)]
pub struct WalletsConfig {
    pub credentials: Credentials,
    pub assets: Vec<AssetConfig>,
}

impl WalletsConfig {
    /// Enabled assets, in configuration order.
    pub fn desired_assets(&self) -> Vec<Asset> {
        self.assets
            .iter()
            .filter(|a| a.enabled)
            .map(|a| a.asset.clone())
            .collect()
    }

    /// Parameters configured for `asset`, or the defaults.
    pub fn params(&self, asset: &Asset) -> AssetParams {
        self.assets
            .iter()
            .find(|a| &a.asset == asset)
            .map(|a| a.params.clone())
            .unwrap_or_default()
    }
}
