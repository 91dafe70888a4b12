//! Engine backend used by the daemon.
//!
//! Every adapter gets its own in-process simulated engine. Per-asset
//! parameters are read from the live config at connection time, so a
//! SIGHUP that changes an asset's fee takes effect for the adapters it
//! (re)creates.

use hoard_core::adapters::EngineProvider;
use hoard_core::config::{AssetParams, ConfigStore, WalletsConfig};
use hoard_core::engine::{EngineConnection, EngineError, SimulatedEngine, SimulationConfig};
use hoard_sdk::objects::Asset;
use std::time::Duration;

pub struct SimulatedProvider {
    config: ConfigStore<WalletsConfig>,
    block_interval: Option<Duration>,
}

impl SimulatedProvider {
    pub fn new(config: ConfigStore<WalletsConfig>, block_interval: Option<Duration>) -> Self {
        Self {
            config,
            block_interval,
        }
    }
}

impl EngineProvider for SimulatedProvider {
    type Engine = SimulatedEngine;

    fn connect(&self, asset: &Asset) -> Result<EngineConnection<SimulatedEngine>, EngineError> {
        tracing::debug!(%asset, "Connecting simulated engine");
        Ok(SimulatedEngine::connect(SimulationConfig {
            address: None,
            block_interval: self.block_interval,
            start_height: 0,
        }))
    }

    fn params(&self, asset: &Asset) -> AssetParams {
        self.config.read().params(asset)
    }
}
