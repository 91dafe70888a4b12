//! TOML file configuration structures.
//!
//! These structs directly map to the `hoard-config.toml` file format.

use compact_str::CompactString;
use hoard_core::config::DEFAULT_CONFIRMATIONS_THRESHOLD;
use hoard_sdk::objects::Credentials;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub simulation: SimulationSection,
    pub credentials: Credentials,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "127.0.0.1:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8080))
}

/// Simulated engine backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationSection {
    /// Mine an empty block every this many seconds. Unset means the chain
    /// only moves when driven.
    pub block_interval_secs: Option<u64>,
}

/// One `[[assets]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetEntry {
    /// Ticker code, unique across the file.
    pub code: CompactString,
    pub name: CompactString,
    /// Decimal places of one display unit.
    pub decimals: u32,
    /// Flat network fee in display units.
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default = "default_confirmations_threshold")]
    pub confirmations_threshold: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_confirmations_threshold() -> u32 {
    DEFAULT_CONFIRMATIONS_THRESHOLD
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[simulation]
block_interval_secs = 5

[credentials]
type = "mnemonic"
words = ["abandon", "ability", "able"]

[[assets]]
code = "ZEC"
name = "Zcash"
decimals = 8
fee = "0.0001"

[[assets]]
code = "YEC"
name = "Ycash"
decimals = 8
confirmations_threshold = 20
enabled = false
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.simulation.block_interval_secs, Some(5));
        assert!(matches!(
            &config.credentials,
            Credentials::Mnemonic { words, salt } if words.len() == 3 && salt.is_empty()
        ));
        assert_eq!(config.assets.len(), 2);
        assert_eq!(config.assets[0].fee, Decimal::new(1, 4));
        assert_eq!(
            config.assets[0].confirmations_threshold,
            DEFAULT_CONFIRMATIONS_THRESHOLD
        );
        assert!(config.assets[0].enabled);
        assert_eq!(config.assets[1].confirmations_threshold, 20);
        assert!(!config.assets[1].enabled);
    }

    #[test]
    fn test_minimal_config_parsing() {
        let toml_str = r#"
[credentials]
type = "watch_only"
viewing_key = "zxviews1example"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.simulation.block_interval_secs, None);
        assert!(config.assets.is_empty());
        assert_eq!(config.credentials.kind(), "watch_only");
    }

    #[test]
    fn test_missing_credentials_is_an_error() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
