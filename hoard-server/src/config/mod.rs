//! Configuration module for hoard-server.
//!
//! Handles loading configuration from the TOML file and CLI arguments, and
//! turning it into the wallet configuration the core consumes.

pub mod file;

use crate::config::file::{AssetEntry, FileConfig};
use hoard_core::config::{AssetConfig, AssetParams, WalletsConfig};
use hoard_sdk::amount::{AmountError, CoinRate};
use hoard_sdk::objects::{Asset, Credentials};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid asset: {0}")]
    AssetError(#[from] AmountError),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub block_interval: Option<Duration>,
    pub wallets: WalletsConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.parse(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    pub(crate) fn parse(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        build_loaded_config(file_config)
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    match &config.credentials {
        Credentials::Mnemonic { words, .. } if words.is_empty() => {
            return Err(ConfigError::ValidationError(
                "mnemonic has no words".to_string(),
            ));
        }
        Credentials::WatchOnly { viewing_key } if viewing_key.is_empty() => {
            return Err(ConfigError::ValidationError(
                "viewing key is empty".to_string(),
            ));
        }
        _ => {}
    }

    for (i, entry) in config.assets.iter().enumerate() {
        if entry.code.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "asset #{} has an empty code",
                i + 1
            )));
        }
        if entry.fee < Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "asset {} has a negative fee",
                entry.code
            )));
        }
        if config.assets[..i].iter().any(|e| e.code == entry.code) {
            return Err(ConfigError::ValidationError(format!(
                "asset {} is listed twice",
                entry.code
            )));
        }
    }

    if config.simulation.block_interval_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "simulation.block_interval_secs must be positive".to_string(),
        ));
    }

    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let assets = file_config
        .assets
        .into_iter()
        .map(convert_asset)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LoadedConfig {
        listen: file_config.server.listen,
        block_interval: file_config
            .simulation
            .block_interval_secs
            .map(Duration::from_secs),
        wallets: WalletsConfig {
            credentials: file_config.credentials,
            assets,
        },
    })
}

fn convert_asset(entry: AssetEntry) -> Result<AssetConfig, ConfigError> {
    Ok(AssetConfig {
        asset: Asset::new(entry.code, entry.name, CoinRate::new(entry.decimals)?),
        params: AssetParams {
            fee: entry.fee,
            confirmations_threshold: entry.confirmations_threshold,
        },
        enabled: entry.enabled,
    })
}
