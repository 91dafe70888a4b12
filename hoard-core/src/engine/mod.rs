//! Chain engine contract.
//!
//! An engine is the long-lived light-client connection behind one adapter.
//! It owns the chain data and its own store; the adapter only reads from it
//! (pull) and listens to its notifications (push, see
//! [`EngineNotification`](crate::events::EngineNotification)).

pub mod simulated;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::events::EngineNotificationReceiver;

pub use simulated::{SimulatedEngine, SimulationConfig};

/// Errors reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine cannot reach its backend.
    #[error("engine is disconnected")]
    Disconnected,

    /// The engine refused an operation.
    #[error("rejected by engine: {0}")]
    Rejected(String),

    /// Reading or clearing the engine's own store failed.
    #[error("engine storage error: {0}")]
    Storage(String),
}

/// Connection and sync status as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    Disconnected,
    Stopped,
    Syncing {
        /// Ratio between 0.0 and 1.0.
        progress: f64,
        last_block_date: Option<OffsetDateTime>,
    },
    Synced,
}

/// Address encodings an engine can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Shielded,
    Transparent,
}

impl AddressKind {
    pub const ALL: [AddressKind; 2] = [AddressKind::Shielded, AddressKind::Transparent];
}

/// Key material able to authorize spends. Opaque to the adapter layer.
#[derive(Clone, PartialEq, Eq)]
pub struct SpendingKey(pub String);

impl std::fmt::Debug for SpendingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SpendingKey(..)")
    }
}

/// A mined transaction as stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    pub hash: String,
    pub transaction_index: u64,
    pub mined_height: u64,
    pub block_time: OffsetDateTime,
    /// Base units.
    pub value: i64,
    /// Destination, when the engine knows it (outgoing sends).
    pub to_address: Option<String>,
    pub memo: Option<String>,
}

/// A transaction the engine created or saw but has not mined yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Known once the transaction has been built and broadcast.
    pub raw_transaction_id: Option<String>,
    pub to_address: String,
    /// Base units.
    pub value: i64,
    pub memo: Option<String>,
    pub create_time: OffsetDateTime,
    pub mined_height: Option<u64>,
    pub failed: bool,
}

/// A live engine plus the receiving end of its notification channel.
pub struct EngineConnection<E> {
    pub engine: E,
    pub notifications: EngineNotificationReceiver,
}

/// The external chain-sync engine.
///
/// Pull-style queries are synchronous and answer from the engine's local
/// store. Lifecycle and sending are asynchronous.
#[async_trait]
pub trait ChainEngine: Send + Sync + 'static {
    /// Current connection/sync status.
    fn status(&self) -> EngineStatus;

    /// Latest chain height the engine knows about.
    fn latest_height(&self) -> Result<u64, EngineError>;

    fn is_valid_address(&self, kind: AddressKind, address: &str) -> bool;

    /// Total balance in base units.
    fn balance(&self) -> i64;

    /// Spendable (sufficiently confirmed) balance in base units.
    fn verified_balance(&self) -> i64;

    /// Receive address of the given account.
    fn address(&self, account: u32) -> String;

    fn cleared_transactions(&self) -> Vec<ConfirmedTransaction>;

    fn pending_transactions(&self) -> Vec<PendingTransaction>;

    /// Derive spending keys for the first `accounts` accounts of a seed.
    fn derive_spending_keys(
        &self,
        words: &[String],
        salt: &str,
        accounts: u32,
    ) -> Result<Vec<SpendingKey>, EngineError>;

    /// Start or resume synchronization.
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop synchronization. Must be idempotent.
    fn stop(&self);

    /// Remove the engine's persisted state.
    async fn clear(&self) -> Result<(), EngineError>;

    /// Build and broadcast a transaction.
    async fn send(
        &self,
        key: &SpendingKey,
        base_units: i64,
        to_address: &str,
        memo: Option<&str>,
    ) -> Result<PendingTransaction, EngineError>;
}
