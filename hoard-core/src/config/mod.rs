//! Configuration types for Hoard.
//!
//! These types represent the validated runtime configuration shared across
//! crates. Loading and parsing files is handled by the server crate.

mod assets;
mod config_store;

pub use assets::{AssetConfig, AssetParams, DEFAULT_CONFIRMATIONS_THRESHOLD, WalletsConfig};
pub use config_store::{ConfigStore, ConfigWatcher};
