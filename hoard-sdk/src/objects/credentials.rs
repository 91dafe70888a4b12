use serde::{Deserialize, Serialize};

/// Account material handed to the adapter factory.
///
/// Only the factory and the adapters look inside. Key derivation itself
/// is the engine's job.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// BIP-39 style word list.
    Mnemonic {
        words: Vec<String>,
        #[serde(default)]
        salt: String,
    },
    /// Raw private key for single-address chains.
    PrivateKey { key: String },
    /// Viewing key only; balances and history but no spending.
    WatchOnly { viewing_key: String },
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Mnemonic { .. } => "mnemonic",
            Credentials::PrivateKey { .. } => "private_key",
            Credentials::WatchOnly { .. } => "watch_only",
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secrets.
        write!(f, "Credentials({})", self.kind())
    }
}
