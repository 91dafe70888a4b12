//! Event type definitions.
//!
//! Two kinds of events flow through an adapter: notifications pushed by
//! the engine into the adapter, and events the adapter publishes for the
//! UI layer.

use hoard_sdk::objects::{AdapterState, LastBlockInfo, TransactionRecord};
use time::OffsetDateTime;

use crate::engine::{ConfirmedTransaction, EngineStatus};

/// Push notification from an engine.
///
/// Notifications may arrive in any order relative to adapter reads. The
/// adapter consumes them one at a time in a single handler loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotification {
    /// Connection or sync status changed (started, stopped, progress...).
    StatusChanged(EngineStatus),
    /// The engine gave up with an error.
    Failed { reason: String },
    /// Newly mined transactions relevant to the wallet.
    FoundTransactions(Vec<ConfirmedTransaction>),
    /// The engine's pending set changed; re-read it.
    TransactionsUpdated,
    /// The engine processed blocks up to `height`.
    BlockHeightUpdated {
        height: u64,
        timestamp: Option<OffsetDateTime>,
    },
}

/// Event published by an adapter for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    /// Emitted only when the state actually changed.
    StateChanged(AdapterState),
    LastBlockUpdated(LastBlockInfo),
    BalanceUpdated,
    /// Records newly inserted or changed. Never the full history.
    TransactionRecords(Vec<TransactionRecord>),
    /// Uids of pending records that disappeared without being mined.
    TransactionsRemoved(Vec<String>),
}
