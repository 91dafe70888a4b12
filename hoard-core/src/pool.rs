//! Transaction pool.
//!
//! The pool is the adapter's in-memory view of every transaction the engine
//! reported, split into a confirmed subset (keyed by hash) and a pending
//! subset (keyed by a correlation key, see [`pending_key`]). Both subsets
//! share one uid space: a pending entry that already carries its hash has
//! the same uid as its mined counterpart, which is how promotion finds it.
//!
//! Entries are ordered by [`TransactionCursor`], so pagination is a range
//! scan below the last returned position. Writers are serialized and
//! publish a fresh immutable snapshot after every merge; readers clone the
//! current snapshot and never see a half-applied merge.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use hoard_sdk::objects::TransactionCursor;
use itertools::Itertools;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::engine::{ConfirmedTransaction, PendingTransaction};

/// Correlation key of a pending transaction.
///
/// The transaction hash when the engine already knows it, so that the
/// mined transaction promotes this entry. Otherwise
/// `recipient:value:created_at_ms`; two unbroadcast sends to the same
/// recipient with the same value created in the same millisecond collapse
/// into one entry.
pub fn pending_key(transaction: &PendingTransaction) -> String {
    match &transaction.raw_transaction_id {
        Some(hash) => hash.clone(),
        None => format!(
            "{}:{}:{}",
            transaction.to_address,
            transaction.value,
            transaction.create_time.unix_timestamp_nanos() / 1_000_000
        ),
    }
}

/// A source transaction held by the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEntry {
    Confirmed(ConfirmedTransaction),
    Pending {
        transaction: PendingTransaction,
        /// Observation order; later observations get larger numbers.
        sequence: u64,
    },
}

impl PoolEntry {
    /// Stable identity: hash for confirmed entries, correlation key for
    /// pending ones.
    pub fn uid(&self) -> String {
        match self {
            PoolEntry::Confirmed(tx) => tx.hash.clone(),
            PoolEntry::Pending { transaction, .. } => pending_key(transaction),
        }
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            PoolEntry::Confirmed(tx) => Some(&tx.hash),
            PoolEntry::Pending { transaction, .. } => transaction.raw_transaction_id.as_deref(),
        }
    }

    pub fn cursor(&self) -> TransactionCursor {
        match self {
            PoolEntry::Confirmed(tx) => {
                TransactionCursor::confirmed(tx.mined_height, tx.transaction_index)
            }
            PoolEntry::Pending { sequence, .. } => TransactionCursor::pending(*sequence),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, PoolEntry::Pending { .. })
    }

    pub fn transaction_index(&self) -> u64 {
        match self {
            PoolEntry::Confirmed(tx) => tx.transaction_index,
            PoolEntry::Pending { .. } => 0,
        }
    }

    pub fn block_height(&self) -> Option<u64> {
        match self {
            PoolEntry::Confirmed(tx) => Some(tx.mined_height),
            PoolEntry::Pending { transaction, .. } => transaction.mined_height,
        }
    }

    pub fn to_address(&self) -> Option<&str> {
        match self {
            PoolEntry::Confirmed(tx) => tx.to_address.as_deref(),
            PoolEntry::Pending { transaction, .. } => Some(&transaction.to_address),
        }
    }

    /// Base units.
    pub fn value(&self) -> i64 {
        match self {
            PoolEntry::Confirmed(tx) => tx.value,
            PoolEntry::Pending { transaction, .. } => transaction.value,
        }
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        match self {
            PoolEntry::Confirmed(tx) => tx.block_time,
            PoolEntry::Pending { transaction, .. } => transaction.create_time,
        }
    }

    pub fn failed(&self) -> bool {
        match self {
            PoolEntry::Confirmed(_) => false,
            PoolEntry::Pending { transaction, .. } => transaction.failed,
        }
    }

    pub fn memo(&self) -> Option<&str> {
        match self {
            PoolEntry::Confirmed(tx) => tx.memo.as_deref(),
            PoolEntry::Pending { transaction, .. } => transaction.memo.as_deref(),
        }
    }
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolDelta {
    /// Entries inserted or replaced by this merge.
    pub changed: Vec<PoolEntry>,
    /// Uids of pending entries dropped without a confirmed counterpart.
    pub removed: Vec<String>,
}

impl PoolDelta {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// One immutable state of the pool.
#[derive(Debug, Clone, Default)]
pub struct PoolSnapshot {
    entries: BTreeMap<TransactionCursor, PoolEntry>,
    positions: HashMap<String, TransactionCursor>,
    next_sequence: u64,
}

impl PoolSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, uid: &str) -> Option<&PoolEntry> {
        self.positions.get(uid).and_then(|c| self.entries.get(c))
    }

    /// Up to `limit` entries strictly after `cursor` in feed order.
    ///
    /// Feed order is pending entries (latest observed first), then
    /// confirmed entries by descending `(height, index)`.
    pub fn query(&self, cursor: Option<TransactionCursor>, limit: usize) -> Vec<PoolEntry> {
        let entries: Box<dyn Iterator<Item = &PoolEntry>> = match cursor {
            Some(cursor) => Box::new(self.entries.range(..cursor).rev().map(|(_, e)| e)),
            None => Box::new(self.entries.values().rev()),
        };
        entries.take(limit).cloned().collect()
    }

    /// Merge a batch of mined transactions.
    pub fn merge_confirmed(&mut self, batch: Vec<ConfirmedTransaction>) -> PoolDelta {
        let mut delta = PoolDelta::default();

        for transaction in batch {
            let entry = PoolEntry::Confirmed(transaction);
            let uid = entry.uid();

            match self.get(&uid) {
                Some(existing) if *existing == entry => continue,
                Some(existing) if existing.is_pending() => {
                    debug!(%uid, "Promoting pending transaction");
                }
                _ => {}
            }

            self.insert(uid, entry.clone());
            delta.changed.push(entry);
        }

        delta
    }

    /// Reconcile against the engine's full current pending set.
    pub fn merge_pending(&mut self, snapshot: Vec<PendingTransaction>) -> PoolDelta {
        let mut delta = PoolDelta::default();

        let present: HashSet<String> = snapshot.iter().map(pending_key).collect();
        let gone: Vec<String> = self
            .entries
            .values()
            .filter(|e| e.is_pending())
            .map(PoolEntry::uid)
            .filter(|uid| !present.contains(uid))
            .collect();
        for uid in gone {
            self.remove(&uid);
            delta.removed.push(uid);
        }

        // Oldest first so that newer observations get larger sequences.
        let snapshot = snapshot
            .into_iter()
            .sorted_by_key(|t| t.create_time)
            .unique_by(pending_key);

        for transaction in snapshot {
            let uid = pending_key(&transaction);
            let sequence = match self.get(&uid) {
                // Mined already; the pending observation is stale.
                Some(PoolEntry::Confirmed(_)) => continue,
                Some(PoolEntry::Pending {
                    transaction: known,
                    sequence,
                }) => {
                    if *known == transaction {
                        continue;
                    }
                    *sequence
                }
                None => {
                    self.next_sequence += 1;
                    self.next_sequence
                }
            };

            let entry = PoolEntry::Pending {
                transaction,
                sequence,
            };
            self.insert(uid, entry.clone());
            delta.changed.push(entry);
        }

        delta
    }

    fn insert(&mut self, uid: String, entry: PoolEntry) {
        self.remove(&uid);
        let cursor = entry.cursor();
        if let Some(displaced) = self.entries.insert(cursor, entry) {
            let displaced = displaced.uid();
            warn!(%uid, %displaced, ?cursor, "Two transactions share one position");
            self.positions.remove(&displaced);
        }
        self.positions.insert(uid, cursor);
    }

    fn remove(&mut self, uid: &str) -> Option<PoolEntry> {
        let cursor = self.positions.remove(uid)?;
        self.entries.remove(&cursor)
    }
}

/// Single-writer, many-reader transaction pool owned by one adapter.
pub struct TransactionPool {
    snapshot: watch::Sender<Arc<PoolSnapshot>>,
    writer: Mutex<()>,
}

impl TransactionPool {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(PoolSnapshot::default()));
        Self {
            snapshot,
            writer: Mutex::new(()),
        }
    }

    /// Rebuild the pool from the engine's own store.
    pub fn from_store(
        confirmed: Vec<ConfirmedTransaction>,
        pending: Vec<PendingTransaction>,
    ) -> Self {
        let mut snapshot = PoolSnapshot::default();
        snapshot.merge_confirmed(confirmed);
        snapshot.merge_pending(pending);
        let (snapshot, _) = watch::channel(Arc::new(snapshot));
        Self {
            snapshot,
            writer: Mutex::new(()),
        }
    }

    pub fn merge_confirmed(&self, batch: Vec<ConfirmedTransaction>) -> PoolDelta {
        self.write(|snapshot| snapshot.merge_confirmed(batch))
    }

    pub fn merge_pending(&self, snapshot: Vec<PendingTransaction>) -> PoolDelta {
        self.write(|current| current.merge_pending(snapshot))
    }

    /// See [`PoolSnapshot::query`].
    pub fn query(&self, cursor: Option<TransactionCursor>, limit: usize) -> Vec<PoolEntry> {
        self.snapshot().query(cursor, limit)
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<PoolSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Watch for published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PoolSnapshot>> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn write(&self, merge: impl FnOnce(&mut PoolSnapshot) -> PoolDelta) -> PoolDelta {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = PoolSnapshot::clone(&self.snapshot());
        let delta = merge(&mut next);
        if !delta.is_empty() {
            self.snapshot.send_replace(Arc::new(next));
        }
        delta
    }
}

impl Default for TransactionPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000 + seconds).unwrap()
    }

    fn confirmed(hash: &str, height: u64, index: u64) -> ConfirmedTransaction {
        ConfirmedTransaction {
            hash: hash.to_string(),
            transaction_index: index,
            mined_height: height,
            block_time: at(height as i64),
            value: 100_000,
            to_address: None,
            memo: None,
        }
    }

    fn pending(hash: Option<&str>, to: &str, created: i64) -> PendingTransaction {
        PendingTransaction {
            raw_transaction_id: hash.map(str::to_string),
            to_address: to.to_string(),
            value: 50_000,
            memo: None,
            create_time: at(created),
            mined_height: None,
            failed: false,
        }
    }

    fn uids(entries: &[PoolEntry]) -> Vec<String> {
        entries.iter().map(PoolEntry::uid).collect()
    }

    #[test]
    fn test_promotion_leaves_one_record() {
        let pool = TransactionPool::new();
        let delta = pool.merge_pending(vec![pending(Some("aa"), "zs1dest", 0)]);
        assert_eq!(uids(&delta.changed), vec!["aa"]);

        let delta = pool.merge_confirmed(vec![confirmed("aa", 100, 0)]);
        assert_eq!(delta.changed.len(), 1);
        assert!(!delta.changed[0].is_pending());

        let all = pool.query(None, 10);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], PoolEntry::Confirmed(confirmed("aa", 100, 0)));
    }

    #[test]
    fn test_stale_pending_after_promotion_is_ignored() {
        let pool = TransactionPool::new();
        pool.merge_pending(vec![pending(Some("aa"), "zs1dest", 0)]);
        pool.merge_confirmed(vec![confirmed("aa", 100, 0)]);

        // The engine may still list it as pending for a moment.
        let delta = pool.merge_pending(vec![pending(Some("aa"), "zs1dest", 0)]);
        assert!(delta.is_empty());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_merge_returns_only_changes() {
        let pool = TransactionPool::new();
        let delta = pool.merge_confirmed(vec![confirmed("a", 1, 0), confirmed("b", 2, 0)]);
        assert_eq!(delta.changed.len(), 2);

        let delta = pool.merge_confirmed(vec![confirmed("a", 1, 0), confirmed("c", 3, 0)]);
        assert_eq!(uids(&delta.changed), vec!["c"]);

        let mut moved = confirmed("a", 4, 1);
        moved.memo = Some("reorg".into());
        let delta = pool.merge_confirmed(vec![moved]);
        assert_eq!(uids(&delta.changed), vec!["a"]);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_pending_reconciliation() {
        let pool = TransactionPool::new();
        pool.merge_pending(vec![
            pending(None, "zs1one", 0),
            pending(Some("bb"), "zs1two", 1),
        ]);
        assert_eq!(pool.len(), 2);

        let mut failed = pending(Some("bb"), "zs1two", 1);
        failed.failed = true;
        let delta = pool.merge_pending(vec![failed, pending(None, "zs1three", 2)]);

        assert_eq!(delta.removed, vec![pending_key(&pending(None, "zs1one", 0))]);
        assert_eq!(delta.changed.len(), 2);
        assert_eq!(pool.len(), 2);
        let bb = pool.snapshot().get("bb").cloned().unwrap();
        assert!(bb.failed());
    }

    #[test]
    fn test_query_order_pending_first() {
        let pool = TransactionPool::new();
        pool.merge_confirmed(vec![
            confirmed("low", 10, 0),
            confirmed("high", 20, 0),
            confirmed("high-second", 20, 1),
        ]);
        pool.merge_pending(vec![
            pending(Some("p-old"), "zs1a", 0),
            pending(Some("p-new"), "zs1b", 5),
        ]);

        let all = pool.query(None, 10);
        assert_eq!(uids(&all), vec!["p-new", "p-old", "high-second", "high", "low"]);
    }

    #[test]
    fn test_cursor_pagination_is_stable_under_inserts() {
        let pool = TransactionPool::new();
        pool.merge_confirmed((1..=6).map(|h| confirmed(&format!("t{h}"), h, 0)).collect());

        let first = pool.query(None, 3);
        assert_eq!(uids(&first), vec!["t6", "t5", "t4"]);
        let cursor = first.last().map(PoolEntry::cursor);

        // New blocks arrive between page requests.
        pool.merge_confirmed(vec![confirmed("t7", 7, 0), confirmed("t8", 8, 0)]);
        pool.merge_pending(vec![pending(Some("p"), "zs1a", 0)]);

        let second = pool.query(cursor, 3);
        assert_eq!(uids(&second), vec!["t3", "t2", "t1"]);
        let third = pool.query(second.last().map(PoolEntry::cursor), 3);
        assert!(third.is_empty());
    }

    #[test]
    fn test_cursor_inside_pending_section() {
        let pool = TransactionPool::new();
        pool.merge_confirmed(vec![confirmed("c", 1, 0)]);
        pool.merge_pending(vec![
            pending(Some("p1"), "zs1a", 0),
            pending(Some("p2"), "zs1b", 1),
        ]);

        let first = pool.query(None, 1);
        assert_eq!(uids(&first), vec!["p2"]);
        let rest = pool.query(first.last().map(PoolEntry::cursor), 10);
        assert_eq!(uids(&rest), vec!["p1", "c"]);
    }

    #[test]
    fn test_from_store_builds_both_subsets() {
        let pool = TransactionPool::from_store(
            vec![confirmed("a", 5, 0)],
            vec![pending(Some("a"), "zs1x", 0), pending(None, "zs1y", 1)],
        );
        // "a" is already mined, so only the anonymous pending entry is added.
        assert_eq!(pool.len(), 2);
        assert!(pool.snapshot().get("a").is_some_and(|e| !e.is_pending()));
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let pool = TransactionPool::new();
        pool.merge_confirmed(vec![confirmed("a", 1, 0)]);
        let before = pool.snapshot();
        pool.merge_confirmed(vec![confirmed("b", 2, 0)]);
        assert_eq!(before.len(), 1);
        assert_eq!(pool.len(), 2);
    }
}
