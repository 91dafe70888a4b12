use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::amount::CoinRate;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// A coin or token tracked by the wallet.
///
/// Assets compare by value; two assets with the same code, name and rate
/// are the same asset.
pub struct Asset {
    /// Ticker code, e.g. `ZEC`.
    pub code: CompactString,
    /// Human-readable name.
    pub name: CompactString,
    /// Base units per display unit.
    pub rate: CoinRate,
}

impl Asset {
    pub fn new(code: impl Into<CompactString>, name: impl Into<CompactString>, rate: CoinRate) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            rate,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Capabilities an adapter variant may declare.
pub enum Capability {
    Sync,
    Balance,
    Transactions,
    Deposit,
    Send,
}
