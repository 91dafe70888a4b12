//! Light-client adapter.
//!
//! Wraps one [`ChainEngine`] connection. Engine notifications are consumed
//! by a single handler loop spawned on the first `start`/`refresh`; the loop
//! owns nothing but a shared handle to the adapter core, so dropping the
//! adapter stops the engine and ends the loop.

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use hoard_sdk::objects::{
    AdapterState, Asset, Credentials, LastBlockInfo, TransactionCursor, TransactionRecord,
    TransactionType, api::AdapterCounters,
};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    Adapter, AdapterError, AdapterFactory, BalanceAdapter, DepositAdapter, SendAdapter,
    TransactionsAdapter,
};
use crate::config::AssetParams;
use crate::engine::{
    AddressKind, ChainEngine, ConfirmedTransaction, EngineConnection, EngineError, EngineStatus,
    SpendingKey,
};
use crate::events::{
    AdapterEvent, AdapterEventReceiver, AdapterEventSender, EngineNotification,
    EngineNotificationReceiver, adapter_event_channel,
};
use crate::metrics::AdapterMetrics;
use crate::pool::{PoolDelta, PoolEntry, TransactionPool};
use crate::sync_state::SyncStateMachine;

/// Opens engine connections for the adapter factory.
pub trait EngineProvider: Send + Sync + 'static {
    type Engine: ChainEngine;

    /// Open a new engine connection for `asset`.
    fn connect(&self, asset: &Asset) -> Result<EngineConnection<Self::Engine>, EngineError>;

    fn params(&self, asset: &Asset) -> AssetParams;
}

/// [`AdapterFactory`] producing [`LightClientAdapter`]s.
pub struct LightClientAdapterFactory<P> {
    provider: P,
}

impl<P: EngineProvider> LightClientAdapterFactory<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: EngineProvider> AdapterFactory for LightClientAdapterFactory<P> {
    fn adapter(
        &self,
        asset: &Asset,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Adapter>, AdapterError> {
        if !LightClientAdapter::<P::Engine>::supports(credentials) {
            return Err(AdapterError::UnsupportedAccount);
        }
        let connection = self.provider.connect(asset)?;
        let params = self.provider.params(asset);
        let adapter = LightClientAdapter::new(asset.clone(), params, connection, credentials)?;
        Ok(Arc::new(adapter))
    }
}

/// State shared between the adapter and its notification loop.
///
/// Every transition that broadcasts an event holds `publish` from the state
/// or pool update until the event is sent, so subscribers see events in the
/// order the transitions happened, whichever task ran them.
struct AdapterCore<E> {
    asset: Asset,
    params: AssetParams,
    engine: E,
    receive_address: String,
    sync_state: SyncStateMachine,
    pool: TransactionPool,
    last_block: watch::Sender<Option<LastBlockInfo>>,
    events: AdapterEventSender,
    metrics: AdapterMetrics,
    publish: Mutex<()>,
}

impl<E: ChainEngine> AdapterCore<E> {
    fn emit(&self, event: AdapterEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn publishing(&self) -> MutexGuard<'_, ()> {
        self.publish.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_state(&self, state: Option<AdapterState>) {
        if let Some(state) = state {
            info!(asset = %self.asset, ?state, "Adapter state changed");
            self.metrics.state_changed();
            self.emit(AdapterEvent::StateChanged(state));
        }
    }

    fn emit_delta(&self, delta: PoolDelta) {
        if !delta.changed.is_empty() {
            let records: Vec<TransactionRecord> =
                delta.changed.iter().map(|e| self.record(e)).collect();
            debug!(asset = %self.asset, count = records.len(), "Transaction records changed");
            self.metrics.records_emitted(records.len());
            self.emit(AdapterEvent::TransactionRecords(records));
        }
        if !delta.removed.is_empty() {
            debug!(asset = %self.asset, count = delta.removed.len(), "Pending transactions dropped");
            self.emit(AdapterEvent::TransactionsRemoved(delta.removed));
        }
    }

    fn apply_status(&self, status: &EngineStatus) {
        let _publishing = self.publishing();
        self.emit_state(self.sync_state.apply(status));
    }

    fn fail(&self, reason: String) {
        let _publishing = self.publishing();
        self.emit_state(self.sync_state.fail(reason));
    }

    fn merge_confirmed(&self, transactions: Vec<ConfirmedTransaction>) {
        let _publishing = self.publishing();
        let delta = self.pool.merge_confirmed(transactions);
        self.emit_delta(delta);
    }

    /// Re-read the engine's pending set into the pool.
    fn sync_pending(&self) {
        let _publishing = self.publishing();
        let delta = self.pool.merge_pending(self.engine.pending_transactions());
        self.emit_delta(delta);
    }

    fn update_last_block(&self, info: LastBlockInfo) {
        let _publishing = self.publishing();
        self.last_block.send_replace(Some(info));
        self.emit(AdapterEvent::LastBlockUpdated(info));
        self.emit(AdapterEvent::BalanceUpdated);
    }

    fn record(&self, entry: &PoolEntry) -> TransactionRecord {
        let uid = entry.uid();
        let incoming = entry
            .to_address()
            .is_none_or(|to| to == self.receive_address);

        TransactionRecord {
            transaction_hash: entry.hash().map_or_else(|| uid.clone(), str::to_owned),
            uid,
            transaction_index: entry.transaction_index(),
            inter_transaction_index: 0,
            kind: if incoming {
                TransactionType::Incoming
            } else {
                TransactionType::Outgoing
            },
            block_height: entry.block_height(),
            confirmations_threshold: self.params.confirmations_threshold,
            amount: self.asset.rate.to_decimal(entry.value()),
            fee: Some(self.params.fee),
            date: entry.timestamp(),
            failed: entry.failed(),
            from: SmallVec::new(),
            to: entry.to_address().map(str::to_owned).into_iter().collect(),
            lock_info: None,
            conflicting_hash: None,
            memo: entry.memo().map(str::to_owned),
            cursor: entry.cursor(),
        }
    }
}

impl<E: ChainEngine> Processor<EngineNotification> for AdapterCore<E> {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, notification: EngineNotification) -> Result<(), Infallible> {
        self.metrics.notification();

        match notification {
            EngineNotification::StatusChanged(status) => self.apply_status(&status),
            EngineNotification::Failed { reason } => {
                warn!(asset = %self.asset, %reason, "Engine reported a failure");
                self.fail(reason);
            }
            EngineNotification::FoundTransactions(transactions) => {
                debug!(asset = %self.asset, count = transactions.len(), "Engine found transactions");
                self.merge_confirmed(transactions);
            }
            EngineNotification::TransactionsUpdated => self.sync_pending(),
            EngineNotification::BlockHeightUpdated { height, timestamp } => {
                self.update_last_block(LastBlockInfo { height, timestamp });
            }
        }

        Ok(())
    }
}

/// Consume engine notifications until shutdown or until the engine hangs up.
async fn run_notification_loop<E: ChainEngine>(
    core: Arc<AdapterCore<E>>,
    mut notifications: EngineNotificationReceiver,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(asset = %core.asset, "Adapter notification loop started");

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }

            Some(notification) = notifications.recv() => {
                let _ = core.process(notification).await;
            }

            else => {
                info!(asset = %core.asset, "Engine notification channel closed");
                break;
            }
        }
    }

    info!(asset = %core.asset, "Adapter notification loop stopped");
}

/// Adapter over a light-client engine.
///
/// Mnemonic credentials give the full capability set. Watch-only
/// credentials give everything except sending.
pub struct LightClientAdapter<E: ChainEngine> {
    id: Uuid,
    core: Arc<AdapterCore<E>>,
    spending_keys: Vec<SpendingKey>,
    notifications: Mutex<Option<EngineNotificationReceiver>>,
    shutdown_tx: watch::Sender<bool>,
}

impl<E: ChainEngine> LightClientAdapter<E> {
    /// Whether this variant can use `credentials` at all.
    pub fn supports(credentials: &Credentials) -> bool {
        matches!(
            credentials,
            Credentials::Mnemonic { .. } | Credentials::WatchOnly { .. }
        )
    }

    /// Build an adapter around an engine connection.
    ///
    /// The pool is rebuilt from the engine's own store; the engine is not
    /// started until [`Adapter::start`].
    pub fn new(
        asset: Asset,
        params: AssetParams,
        connection: EngineConnection<E>,
        credentials: &Credentials,
    ) -> Result<Self, AdapterError> {
        let EngineConnection {
            engine,
            notifications,
        } = connection;

        let spending_keys = match credentials {
            Credentials::Mnemonic { words, salt } => engine.derive_spending_keys(words, salt, 1)?,
            Credentials::WatchOnly { .. } => Vec::new(),
            Credentials::PrivateKey { .. } => return Err(AdapterError::UnsupportedAccount),
        };

        let pool =
            TransactionPool::from_store(engine.cleared_transactions(), engine.pending_transactions());
        let last_block = engine
            .latest_height()
            .ok()
            .map(|height| LastBlockInfo {
                height,
                timestamp: None,
            });
        let (last_block, _) = watch::channel(last_block);
        let (shutdown_tx, _) = watch::channel(false);
        let receive_address = engine.address(0);

        debug!(
            %asset,
            records = pool.len(),
            watch_only = spending_keys.is_empty(),
            "Light client adapter created"
        );

        Ok(Self {
            id: Uuid::new_v4(),
            core: Arc::new(AdapterCore {
                asset,
                params,
                engine,
                receive_address,
                sync_state: SyncStateMachine::new(),
                pool,
                last_block,
                events: adapter_event_channel(),
                metrics: AdapterMetrics::default(),
                publish: Mutex::new(()),
            }),
            spending_keys,
            notifications: Mutex::new(Some(notifications)),
            shutdown_tx,
        })
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.core.engine
    }

    /// Watch the sync state directly instead of through [`Adapter::subscribe`].
    pub fn watch_state(&self) -> watch::Receiver<AdapterState> {
        self.core.sync_state.subscribe()
    }

    fn ensure_notification_loop(&self) {
        let receiver = self
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(receiver) = receiver {
            tokio::spawn(run_notification_loop(
                Arc::clone(&self.core),
                receiver,
                self.shutdown_tx.subscribe(),
            ));
        }
    }

    async fn sync(&self) {
        self.ensure_notification_loop();
        if let Err(e) = self.core.engine.start().await {
            warn!(asset = %self.core.asset, error = %e, "Engine failed to start");
            self.core.fail(e.to_string());
        }
    }
}

impl<E: ChainEngine> Drop for LightClientAdapter<E> {
    fn drop(&mut self) {
        self.core.engine.stop();
        self.shutdown_tx.send_replace(true);
    }
}

#[async_trait]
impl<E: ChainEngine> Adapter for LightClientAdapter<E> {
    fn id(&self) -> Uuid {
        self.id
    }

    fn asset(&self) -> &Asset {
        &self.core.asset
    }

    async fn start(&self) {
        info!(asset = %self.core.asset, id = %self.id, "Starting adapter");
        self.sync().await;
    }

    fn stop(&self) {
        debug!(asset = %self.core.asset, id = %self.id, "Stopping adapter");
        self.core.engine.stop();
    }

    async fn refresh(&self) {
        debug!(asset = %self.core.asset, id = %self.id, "Refreshing adapter");
        self.sync().await;
    }

    async fn clear(&self, except_ids: &[Uuid]) -> Result<(), AdapterError> {
        if except_ids.contains(&self.id) {
            return Ok(());
        }
        info!(asset = %self.core.asset, id = %self.id, "Clearing engine data");
        self.core.engine.clear().await?;
        Ok(())
    }

    fn state(&self) -> AdapterState {
        self.core.sync_state.state()
    }

    fn subscribe(&self) -> AdapterEventReceiver {
        self.core.events.subscribe()
    }

    fn debug_info(&self) -> String {
        let engine = &self.core.engine;
        format!(
            "{} adapter {}\naddress: {}\nstatus: {:?}\nspending keys: {}\nbalance: {}\nverified balance: {}",
            self.core.asset,
            self.id,
            self.core.receive_address,
            engine.status(),
            self.spending_keys.len(),
            engine.balance(),
            engine.verified_balance(),
        )
    }

    fn counters(&self) -> AdapterCounters {
        self.core.metrics.snapshot()
    }

    fn as_balance(&self) -> Option<&dyn BalanceAdapter> {
        Some(self)
    }

    fn as_transactions(&self) -> Option<&dyn TransactionsAdapter> {
        Some(self)
    }

    fn as_deposit(&self) -> Option<&dyn DepositAdapter> {
        Some(self)
    }

    fn as_send(&self) -> Option<&dyn SendAdapter> {
        if self.spending_keys.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl<E: ChainEngine> BalanceAdapter for LightClientAdapter<E> {
    fn balance(&self) -> Decimal {
        self.core.asset.rate.to_decimal(self.core.engine.balance())
    }

    fn locked_balance(&self) -> Option<Decimal> {
        let engine = &self.core.engine;
        let locked = engine.balance() - engine.verified_balance();
        (locked != 0).then(|| self.core.asset.rate.to_decimal(locked))
    }

    fn available_balance(&self) -> Decimal {
        let verified = self
            .core
            .asset
            .rate
            .to_decimal(self.core.engine.verified_balance());
        (verified - self.core.params.fee).max(Decimal::ZERO)
    }
}

impl<E: ChainEngine> TransactionsAdapter for LightClientAdapter<E> {
    fn transactions(
        &self,
        from: Option<TransactionCursor>,
        limit: usize,
    ) -> Vec<TransactionRecord> {
        self.core
            .pool
            .query(from, limit)
            .iter()
            .map(|e| self.core.record(e))
            .collect()
    }

    fn last_block_info(&self) -> Option<LastBlockInfo> {
        *self.core.last_block.borrow()
    }

    fn raw_transaction(&self, _hash: &str) -> Option<String> {
        // Light clients keep no raw transaction bytes.
        None
    }
}

impl<E: ChainEngine> DepositAdapter for LightClientAdapter<E> {
    fn receive_address(&self) -> String {
        self.core.receive_address.clone()
    }
}

#[async_trait]
impl<E: ChainEngine> SendAdapter for LightClientAdapter<E> {
    fn fee(&self) -> Decimal {
        self.core.params.fee
    }

    fn validate_address(&self, address: &str) -> Result<(), AdapterError> {
        let engine = &self.core.engine;
        if AddressKind::ALL
            .iter()
            .any(|kind| engine.is_valid_address(*kind, address))
        {
            Ok(())
        } else {
            Err(AdapterError::InvalidParameter(format!(
                "unrecognized address: {address}"
            )))
        }
    }

    async fn send(
        &self,
        amount: Decimal,
        address: &str,
        memo: Option<&str>,
    ) -> Result<(), AdapterError> {
        if amount <= Decimal::ZERO {
            return Err(AdapterError::InvalidParameter(
                "amount must be positive".into(),
            ));
        }
        let base_units = self.core.asset.rate.to_base_units(amount)?;
        let key = self
            .spending_keys
            .first()
            .ok_or(AdapterError::UnsupportedAccount)?;

        let result = self
            .core
            .engine
            .send(key, base_units, address, memo)
            .await;

        // Make the new pending transaction visible right away, whatever
        // the outcome.
        self.core.sync_pending();

        let succeeded = result.is_ok();
        self.core.metrics.send_finished(succeeded);
        match result {
            Ok(_) => {
                info!(asset = %self.core.asset, base_units, "Send accepted by engine");
                Ok(())
            }
            Err(e) => {
                warn!(asset = %self.core.asset, base_units, error = %e, "Send rejected by engine");
                Err(AdapterError::SendFailure(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use hoard_sdk::amount::CoinRate;
    use hoard_sdk::objects::{Capability, SyncError};
    use time::OffsetDateTime;
    use tokio::time::timeout;

    use super::*;
    use crate::engine::{PendingTransaction, SimulatedEngine, SimulationConfig};

    struct SimulatedProvider;

    impl EngineProvider for SimulatedProvider {
        type Engine = SimulatedEngine;

        fn connect(&self, _asset: &Asset) -> Result<EngineConnection<SimulatedEngine>, EngineError> {
            Ok(SimulatedEngine::connect(SimulationConfig::default()))
        }

        fn params(&self, _asset: &Asset) -> AssetParams {
            AssetParams::default()
        }
    }

    fn zec() -> Asset {
        Asset::new("ZEC", "Zcash", CoinRate::new(8).unwrap())
    }

    fn mnemonic() -> Credentials {
        Credentials::Mnemonic {
            words: vec!["abandon".to_string(); 24],
            salt: String::new(),
        }
    }

    fn watch_only() -> Credentials {
        Credentials::WatchOnly {
            viewing_key: "zxviews1test".into(),
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn adapter(credentials: Credentials) -> LightClientAdapter<SimulatedEngine> {
        let connection = SimulatedEngine::connect(SimulationConfig {
            address: Some("zs1self".into()),
            ..Default::default()
        });
        let params = AssetParams {
            fee: dec("0.0001"),
            confirmations_threshold: 10,
        };
        LightClientAdapter::new(zec(), params, connection, &credentials).unwrap()
    }

    async fn next_event(rx: &mut AdapterEventReceiver) -> AdapterEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_locked_balance() {
        let adapter = adapter(mnemonic());

        adapter.engine().set_balance(150_000_000, 100_000_000);
        assert_eq!(adapter.balance(), dec("1.5"));
        assert_eq!(adapter.locked_balance(), Some(dec("0.5")));
        assert_eq!(adapter.available_balance(), dec("0.9999"));

        adapter.engine().set_balance(100_000_000, 100_000_000);
        assert_eq!(adapter.locked_balance(), None);
    }

    #[test]
    fn test_available_balance_floors_at_zero() {
        let adapter = adapter(mnemonic());
        adapter.engine().set_balance(5_000, 5_000);
        assert_eq!(adapter.available_balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_send_converts_to_base_units() {
        let adapter = adapter(mnemonic());
        adapter.engine().set_balance(1_000_000_000, 1_000_000_000);

        adapter.send(dec("1.5"), "zs1dest", None).await.unwrap();
        adapter
            .send(dec("1.500000005"), "zs1dest", Some("rent"))
            .await
            .unwrap();

        let values: Vec<i64> = adapter.engine().sent().iter().map(|t| t.value).collect();
        assert_eq!(values, vec![150_000_000, 150_000_000]);
        assert_eq!(adapter.counters().sends_succeeded, 2);

        // The pending sends are visible without waiting for the engine.
        let records = adapter.transactions(None, 10);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.kind == TransactionType::Outgoing));
        assert!(records.iter().all(|r| r.block_height.is_none()));
        assert_eq!(records[0].memo.as_deref(), Some("rent"));
    }

    #[tokio::test]
    async fn test_send_rejections() {
        let adapter = adapter(mnemonic());
        adapter.engine().set_balance(100, 100);

        assert!(matches!(
            adapter.send(Decimal::ZERO, "zs1dest", None).await,
            Err(AdapterError::InvalidParameter(_))
        ));
        assert!(matches!(
            adapter.send(dec("-1"), "zs1dest", None).await,
            Err(AdapterError::InvalidParameter(_))
        ));

        adapter.engine().reject_sends(Some("no route".into()));
        assert_eq!(
            adapter.send(dec("0.000001"), "zs1dest", None).await,
            Err(AdapterError::SendFailure("rejected by engine: no route".into()))
        );
        assert_eq!(adapter.counters().sends_failed, 1);
        assert!(adapter.engine().sent().is_empty());
    }

    #[tokio::test]
    async fn test_mined_send_is_promoted() {
        let adapter = adapter(mnemonic());
        adapter.engine().set_balance(1_000_000_000, 1_000_000_000);
        adapter.start().await;

        adapter.send(dec("2"), "zs1dest", None).await.unwrap();
        let sent = adapter.engine().sent().remove(0);
        let hash = sent.raw_transaction_id.clone().unwrap();

        let mut rx = adapter.subscribe();
        adapter.engine().mine(vec![ConfirmedTransaction {
            hash: hash.clone(),
            transaction_index: 3,
            mined_height: 1_000,
            block_time: sent.create_time,
            value: sent.value,
            to_address: Some("zs1dest".into()),
            memo: None,
        }]);

        let records = loop {
            if let AdapterEvent::TransactionRecords(records) = next_event(&mut rx).await {
                break records;
            }
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uid, hash);
        assert_eq!(records[0].block_height, Some(1_000));

        let all = adapter.transactions(None, 10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].transaction_hash, hash);
        assert!(all[0].is_confirmed(1_009));
    }

    #[tokio::test]
    async fn test_duplicate_status_emits_once() {
        let adapter = adapter(mnemonic());
        let mut rx = adapter.subscribe();
        adapter.start().await;

        let syncing = EngineStatus::Syncing {
            progress: 0.45,
            last_block_date: None,
        };
        adapter.engine().set_status(syncing.clone());
        adapter.engine().set_status(syncing);
        adapter.engine().set_status(EngineStatus::Synced);
        adapter.engine().advance_height(1);

        assert_eq!(
            next_event(&mut rx).await,
            AdapterEvent::StateChanged(AdapterState::Syncing {
                progress: 45,
                last_block_date: None
            })
        );
        assert_eq!(
            next_event(&mut rx).await,
            AdapterEvent::StateChanged(AdapterState::Synced)
        );
        assert!(matches!(
            next_event(&mut rx).await,
            AdapterEvent::LastBlockUpdated(LastBlockInfo { height: 1, .. })
        ));
        assert_eq!(next_event(&mut rx).await, AdapterEvent::BalanceUpdated);
        assert_eq!(adapter.state(), AdapterState::Synced);
        assert_eq!(adapter.last_block_info().map(|b| b.height), Some(1));
    }

    #[tokio::test]
    async fn test_start_failure_is_reported_in_state() {
        let adapter = adapter(mnemonic());
        adapter
            .engine()
            .fail_start(Some("backend unreachable".into()));
        adapter.start().await;

        assert_eq!(
            adapter.state(),
            AdapterState::NotSynced {
                error: SyncError::Failed("rejected by engine: backend unreachable".into())
            }
        );

        adapter.engine().fail_start(None);
        let mut rx = adapter.subscribe();
        adapter.refresh().await;
        assert_eq!(adapter.engine().start_count(), 2);

        assert!(matches!(
            next_event(&mut rx).await,
            AdapterEvent::StateChanged(AdapterState::Syncing { progress: 0, .. })
        ));
        assert!(matches!(
            adapter.state(),
            AdapterState::Syncing { progress: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_stop_and_restart() {
        let adapter = adapter(mnemonic());
        let mut rx = adapter.subscribe();

        adapter.start().await;
        adapter.engine().set_status(EngineStatus::Synced);
        assert_eq!(
            next_event(&mut rx).await,
            AdapterEvent::StateChanged(AdapterState::Synced)
        );

        adapter.stop();
        assert_eq!(adapter.engine().status(), EngineStatus::Stopped);
        assert_eq!(
            next_event(&mut rx).await,
            AdapterEvent::StateChanged(AdapterState::NotSynced {
                error: SyncError::Unknown
            })
        );

        adapter.start().await;
        assert!(matches!(
            next_event(&mut rx).await,
            AdapterEvent::StateChanged(AdapterState::Syncing { progress: 0, .. })
        ));
        assert_eq!(adapter.engine().start_count(), 2);
    }

    #[test]
    fn test_concurrent_merges_publish_in_pool_order() {
        const HASH: &str = "c0ffee";

        for _ in 0..200 {
            let adapter = adapter(mnemonic());
            let mut rx = adapter.subscribe();
            adapter.engine().add_pending(PendingTransaction {
                raw_transaction_id: Some(HASH.into()),
                to_address: "zs1dest".into(),
                value: 10,
                memo: None,
                create_time: OffsetDateTime::UNIX_EPOCH,
                mined_height: None,
                failed: false,
            });
            let mined = ConfirmedTransaction {
                hash: HASH.into(),
                transaction_index: 0,
                mined_height: 10,
                block_time: OffsetDateTime::UNIX_EPOCH,
                value: 10,
                to_address: Some("zs1dest".into()),
                memo: None,
            };

            let core = &adapter.core;
            std::thread::scope(|s| {
                s.spawn(|| core.sync_pending());
                s.spawn(|| core.merge_confirmed(vec![mined]));
            });

            let mut last_seen = None;
            while let Ok(event) = rx.try_recv() {
                if let AdapterEvent::TransactionRecords(records) = event {
                    if let Some(record) = records.into_iter().rev().find(|r| r.uid == HASH) {
                        last_seen = Some(record);
                    }
                }
            }

            let pooled = adapter.transactions(None, 10);
            assert_eq!(pooled.len(), 1);
            assert_eq!(pooled[0].block_height, Some(10));
            assert_eq!(last_seen.unwrap().block_height, Some(10));
        }
    }

    #[test]
    fn test_watch_only_cannot_send() {
        let adapter = adapter(watch_only());
        assert!(adapter.as_send().is_none());
        assert_eq!(
            adapter.capabilities(),
            vec![
                Capability::Sync,
                Capability::Balance,
                Capability::Transactions,
                Capability::Deposit
            ]
        );
        assert_eq!(adapter.receive_address(), "zs1self");
    }

    #[test]
    fn test_mnemonic_has_every_capability() {
        let adapter = adapter(mnemonic());
        assert!(adapter.capabilities().contains(&Capability::Send));
    }

    #[test]
    fn test_factory_rejects_private_keys() {
        let factory = LightClientAdapterFactory::new(SimulatedProvider);
        let result = factory.adapter(&zec(), &Credentials::PrivateKey { key: "k".into() });
        assert!(matches!(result, Err(AdapterError::UnsupportedAccount)));
        assert!(factory.adapter(&zec(), &mnemonic()).is_ok());
    }

    #[test]
    fn test_validate_address() {
        let adapter = adapter(mnemonic());
        assert!(adapter.validate_address("zs1abcdef").is_ok());
        assert!(adapter.validate_address("t1abcdef").is_ok());
        assert!(matches!(
            adapter.validate_address("bc1qnotzcash"),
            Err(AdapterError::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_skips_excepted_ids() {
        let adapter = adapter(mnemonic());
        adapter.clear(&[adapter.id()]).await.unwrap();
        assert_eq!(adapter.engine().clear_count(), 0);

        adapter.clear(&[]).await.unwrap();
        assert_eq!(adapter.engine().clear_count(), 1);
    }

    #[test]
    fn test_drop_stops_engine() {
        let adapter = adapter(mnemonic());
        let engine = adapter.engine().clone();
        drop(adapter);
        assert_eq!(engine.stop_count(), 1);
    }
}
