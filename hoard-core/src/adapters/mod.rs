//! Adapter capability contract.
//!
//! An adapter is the per-asset façade the rest of the wallet talks to.
//! Every adapter is syncable ([`Adapter`]); the other capabilities are
//! optional and discovered through the `as_*` accessors, so a watch-only
//! asset simply answers `None` to [`Adapter::as_send`].

pub mod light_client;

use std::sync::Arc;

use async_trait::async_trait;
use hoard_sdk::amount::AmountError;
use hoard_sdk::objects::{
    AdapterState, Asset, Capability, Credentials, LastBlockInfo, TransactionCursor,
    TransactionRecord, api::AdapterCounters,
};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::engine::EngineError;
use crate::events::AdapterEventReceiver;

pub use light_client::{EngineProvider, LightClientAdapter, LightClientAdapterFactory};

/// Errors surfaced across the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The credentials cannot be used by this adapter variant.
    #[error("unsupported account type")]
    UnsupportedAccount,

    /// Bad address or amount supplied by the caller.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("no connection")]
    Connection,

    #[error("unknown error: {0}")]
    Unknown(String),

    /// The engine rejected a send.
    #[error("send failed: {0}")]
    SendFailure(String),

    /// The adapter does not offer this capability.
    #[error("capability not supported: {0:?}")]
    NotSupported(Capability),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl From<AmountError> for AdapterError {
    fn from(e: AmountError) -> Self {
        AdapterError::InvalidParameter(e.to_string())
    }
}

/// The syncable core every adapter provides.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Identity of this adapter instance.
    fn id(&self) -> Uuid;

    fn asset(&self) -> &Asset;

    /// Start synchronizing. Failures end up in [`Adapter::state`].
    ///
    /// Callers serialize lifecycle calls per adapter.
    async fn start(&self);

    /// Stop synchronizing. Idempotent and safe to call during teardown.
    fn stop(&self);

    /// Kick the engine again, e.g. after a `NotSynced` state.
    async fn refresh(&self);

    /// Irreversibly remove the engine's persisted state, unless this
    /// adapter's id is in `except_ids`.
    async fn clear(&self, except_ids: &[Uuid]) -> Result<(), AdapterError>;

    fn state(&self) -> AdapterState;

    /// Subscribe to state, block, balance and record events.
    fn subscribe(&self) -> AdapterEventReceiver;

    fn debug_info(&self) -> String;

    fn counters(&self) -> AdapterCounters {
        AdapterCounters::default()
    }

    fn as_balance(&self) -> Option<&dyn BalanceAdapter> {
        None
    }

    fn as_transactions(&self) -> Option<&dyn TransactionsAdapter> {
        None
    }

    fn as_deposit(&self) -> Option<&dyn DepositAdapter> {
        None
    }

    fn as_send(&self) -> Option<&dyn SendAdapter> {
        None
    }

    fn capabilities(&self) -> Vec<Capability> {
        let mut capabilities = vec![Capability::Sync];
        if self.as_balance().is_some() {
            capabilities.push(Capability::Balance);
        }
        if self.as_transactions().is_some() {
            capabilities.push(Capability::Transactions);
        }
        if self.as_deposit().is_some() {
            capabilities.push(Capability::Deposit);
        }
        if self.as_send().is_some() {
            capabilities.push(Capability::Send);
        }
        capabilities
    }
}

pub trait BalanceAdapter: Send + Sync {
    fn balance(&self) -> Decimal;

    /// Unconfirmed part of the balance, or `None` when nothing is locked.
    ///
    /// `None` means "nothing to report", which is not the same as zero.
    fn locked_balance(&self) -> Option<Decimal>;

    /// Verified balance minus the fee, floored at zero.
    fn available_balance(&self) -> Decimal;
}

pub trait TransactionsAdapter: Send + Sync {
    /// Up to `limit` records after `from`, see
    /// [`PoolSnapshot::query`](crate::pool::PoolSnapshot::query).
    fn transactions(&self, from: Option<TransactionCursor>, limit: usize)
    -> Vec<TransactionRecord>;

    fn last_block_info(&self) -> Option<LastBlockInfo>;

    fn raw_transaction(&self, hash: &str) -> Option<String>;
}

pub trait DepositAdapter: Send + Sync {
    /// Stable for the adapter's lifetime.
    fn receive_address(&self) -> String;
}

#[async_trait]
pub trait SendAdapter: Send + Sync {
    fn fee(&self) -> Decimal;

    /// Accepts the address if any recognized encoding does.
    fn validate_address(&self, address: &str) -> Result<(), AdapterError>;

    /// Send `amount` display units to `address`.
    ///
    /// Resolves exactly once, with success or an error.
    async fn send(
        &self,
        amount: Decimal,
        address: &str,
        memo: Option<&str>,
    ) -> Result<(), AdapterError>;
}

/// Creates adapters for the wallet registry.
pub trait AdapterFactory: Send + Sync {
    fn adapter(
        &self,
        asset: &Asset,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Adapter>, AdapterError>;
}
