//! In-process engine simulation.
//!
//! Stands in for a real light client in tests and in the daemon's demo
//! mode. Everything is driven explicitly through the `SimulatedEngine`
//! driver methods, plus an optional block ticker started by
//! [`ChainEngine::start`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{
    AddressKind, ChainEngine, ConfirmedTransaction, EngineConnection, EngineError, EngineStatus,
    PendingTransaction, SpendingKey,
};
use crate::events::{EngineNotification, EngineNotificationSender, engine_notification_channel};

#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    /// Receive address; a random shielded address when unset.
    pub address: Option<String>,
    /// Mine an empty block this often once started.
    pub block_interval: Option<Duration>,
    pub start_height: u64,
}

#[derive(Debug)]
struct SimulationState {
    status: EngineStatus,
    height: u64,
    balance: i64,
    verified_balance: i64,
    confirmed: Vec<ConfirmedTransaction>,
    pending: Vec<PendingTransaction>,
    sent: Vec<PendingTransaction>,
    fail_start: Option<String>,
    reject_sends: Option<String>,
}

struct Inner {
    address: String,
    block_interval: Option<Duration>,
    notifications: EngineNotificationSender,
    state: Mutex<SimulationState>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    start_count: AtomicUsize,
    stop_count: AtomicUsize,
    clear_count: AtomicUsize,
}

/// A scriptable [`ChainEngine`]. Clones share one engine.
#[derive(Clone)]
pub struct SimulatedEngine {
    inner: Arc<Inner>,
}

impl SimulatedEngine {
    pub fn connect(config: SimulationConfig) -> EngineConnection<SimulatedEngine> {
        let (tx, rx) = engine_notification_channel();
        let address = config
            .address
            .unwrap_or_else(|| format!("zs1{}", Uuid::new_v4().simple()));

        let engine = SimulatedEngine {
            inner: Arc::new(Inner {
                address,
                block_interval: config.block_interval,
                notifications: tx,
                state: Mutex::new(SimulationState {
                    status: EngineStatus::Stopped,
                    height: config.start_height,
                    balance: 0,
                    verified_balance: 0,
                    confirmed: Vec::new(),
                    pending: Vec::new(),
                    sent: Vec::new(),
                    fail_start: None,
                    reject_sends: None,
                }),
                ticker: Mutex::new(None),
                start_count: AtomicUsize::new(0),
                stop_count: AtomicUsize::new(0),
                clear_count: AtomicUsize::new(0),
            }),
        };

        EngineConnection {
            engine,
            notifications: rx,
        }
    }

    fn state(&self) -> MutexGuard<'_, SimulationState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a raw notification to the adapter. Dropped when the channel
    /// is full or closed.
    pub fn notify(&self, notification: EngineNotification) {
        if let Err(e) = self.inner.notifications.try_send(notification) {
            trace!(error = %e, "Simulated notification dropped");
        }
    }

    pub fn set_status(&self, status: EngineStatus) {
        self.state().status = status.clone();
        self.notify(EngineNotification::StatusChanged(status));
    }

    /// Mine `transactions`, replacing pending ones with the same hash.
    pub fn mine(&self, transactions: Vec<ConfirmedTransaction>) {
        {
            let mut state = self.state();
            for tx in &transactions {
                state
                    .pending
                    .retain(|p| p.raw_transaction_id.as_deref() != Some(tx.hash.as_str()));
                state.confirmed.retain(|c| c.hash != tx.hash);
                state.confirmed.push(tx.clone());
                state.height = state.height.max(tx.mined_height);
            }
        }
        self.notify(EngineNotification::FoundTransactions(transactions));
        self.notify(EngineNotification::TransactionsUpdated);
    }

    pub fn add_pending(&self, transaction: PendingTransaction) {
        self.state().pending.push(transaction);
        self.notify(EngineNotification::TransactionsUpdated);
    }

    /// Base units.
    pub fn set_balance(&self, balance: i64, verified_balance: i64) {
        let mut state = self.state();
        state.balance = balance;
        state.verified_balance = verified_balance;
    }

    pub fn advance_height(&self, blocks: u64) {
        let height = {
            let mut state = self.state();
            state.height += blocks;
            state.height
        };
        self.notify(EngineNotification::BlockHeightUpdated {
            height,
            timestamp: Some(OffsetDateTime::now_utc()),
        });
    }

    /// Make the next `start` calls fail with `reason`, or succeed again.
    pub fn fail_start(&self, reason: Option<String>) {
        self.state().fail_start = reason;
    }

    /// Make `send` fail with `reason`, or succeed again.
    pub fn reject_sends(&self, reason: Option<String>) {
        self.state().reject_sends = reason;
    }

    /// Every transaction accepted by `send`, oldest first.
    pub fn sent(&self) -> Vec<PendingTransaction> {
        self.state().sent.clone()
    }

    pub fn start_count(&self) -> usize {
        self.inner.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.inner.stop_count.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.inner.clear_count.load(Ordering::SeqCst)
    }

    fn spawn_ticker(&self, interval: Duration) {
        let mut ticker = self
            .inner
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let engine = SimulatedEngine { inner };
                if engine.status() != EngineStatus::Synced {
                    engine.set_status(EngineStatus::Synced);
                }
                engine.advance_height(1);
            }
        }));
    }
}

#[async_trait]
impl ChainEngine for SimulatedEngine {
    fn status(&self) -> EngineStatus {
        self.state().status.clone()
    }

    fn latest_height(&self) -> Result<u64, EngineError> {
        let state = self.state();
        match state.status {
            EngineStatus::Disconnected => Err(EngineError::Disconnected),
            _ => Ok(state.height),
        }
    }

    fn is_valid_address(&self, kind: AddressKind, address: &str) -> bool {
        let body_ok = |prefix: &str| {
            address
                .strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
        };
        match kind {
            AddressKind::Shielded => body_ok("zs1"),
            AddressKind::Transparent => body_ok("t1") || body_ok("t3"),
        }
    }

    fn balance(&self) -> i64 {
        self.state().balance
    }

    fn verified_balance(&self) -> i64 {
        self.state().verified_balance
    }

    fn address(&self, _account: u32) -> String {
        self.inner.address.clone()
    }

    fn cleared_transactions(&self) -> Vec<ConfirmedTransaction> {
        self.state().confirmed.clone()
    }

    fn pending_transactions(&self) -> Vec<PendingTransaction> {
        self.state().pending.clone()
    }

    fn derive_spending_keys(
        &self,
        words: &[String],
        _salt: &str,
        accounts: u32,
    ) -> Result<Vec<SpendingKey>, EngineError> {
        if words.is_empty() {
            return Err(EngineError::Rejected("empty mnemonic".into()));
        }
        Ok((0..accounts)
            .map(|account| SpendingKey(format!("simulated-sk-{account}")))
            .collect())
    }

    async fn start(&self) -> Result<(), EngineError> {
        self.inner.start_count.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.state().fail_start.clone() {
            return Err(EngineError::Rejected(reason));
        }

        debug!(address = %self.inner.address, "Simulated engine started");
        if self.status() != EngineStatus::Synced {
            self.set_status(EngineStatus::Syncing {
                progress: 0.0,
                last_block_date: None,
            });
        }
        if let Some(interval) = self.inner.block_interval {
            self.spawn_ticker(interval);
        }
        Ok(())
    }

    fn stop(&self) {
        self.inner.stop_count.fetch_add(1, Ordering::SeqCst);
        let ticker = self
            .inner
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ticker) = ticker {
            ticker.abort();
        }

        let changed = {
            let mut state = self.state();
            let changed = state.status != EngineStatus::Stopped;
            state.status = EngineStatus::Stopped;
            changed
        };
        if changed {
            debug!(address = %self.inner.address, "Simulated engine stopped");
            self.notify(EngineNotification::StatusChanged(EngineStatus::Stopped));
        }
    }

    async fn clear(&self) -> Result<(), EngineError> {
        self.inner.clear_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        state.confirmed.clear();
        state.pending.clear();
        state.balance = 0;
        state.verified_balance = 0;
        state.height = 0;
        Ok(())
    }

    async fn send(
        &self,
        _key: &SpendingKey,
        base_units: i64,
        to_address: &str,
        memo: Option<&str>,
    ) -> Result<PendingTransaction, EngineError> {
        let mut state = self.state();
        if let Some(reason) = state.reject_sends.clone() {
            return Err(EngineError::Rejected(reason));
        }
        if base_units > state.verified_balance {
            return Err(EngineError::Rejected("insufficient funds".into()));
        }

        let transaction = PendingTransaction {
            raw_transaction_id: Some(Uuid::new_v4().simple().to_string()),
            to_address: to_address.to_owned(),
            value: base_units,
            memo: memo.map(str::to_owned),
            create_time: OffsetDateTime::now_utc(),
            mined_height: None,
            failed: false,
        };
        state.balance -= base_units;
        state.verified_balance -= base_units;
        state.pending.push(transaction.clone());
        state.sent.push(transaction.clone());
        Ok(transaction)
    }
}
