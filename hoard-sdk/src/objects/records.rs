//! UI-facing transaction records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Incoming,
    Outgoing,
}

/// Lock metadata for time-locked outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    #[serde(with = "time::serde::timestamp")]
    pub locked_until: OffsetDateTime,
    pub original_address: String,
}

/// Pagination position of a record.
///
/// Confirmed records sit at `(block_height, transaction_index)`. Pending
/// records have no height and are positioned by their observation
/// sequence instead; they always sort before every confirmed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionCursor {
    pub block_height: Option<u64>,
    pub index: u64,
}

impl TransactionCursor {
    pub fn confirmed(block_height: u64, index: u64) -> Self {
        Self {
            block_height: Some(block_height),
            index,
        }
    }

    pub fn pending(sequence: u64) -> Self {
        Self {
            block_height: None,
            index: sequence,
        }
    }
}

impl Ord for TransactionCursor {
    /// Feed order: a greater cursor is shown earlier.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self.block_height, other.block_height) {
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (a, b) => a.cmp(&b).then(self.index.cmp(&other.index)),
        }
    }
}

impl PartialOrd for TransactionCursor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Canonical transaction record.
///
/// Immutable once built. When the source entity changes (a pending send
/// gets mined, for instance) a new record with the same `uid` replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub uid: String,
    pub transaction_hash: String,
    pub transaction_index: u64,
    pub inter_transaction_index: u32,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub block_height: Option<u64>,
    pub confirmations_threshold: u32,
    pub amount: Decimal,
    pub fee: Option<Decimal>,
    #[serde(with = "time::serde::timestamp")]
    pub date: OffsetDateTime,
    pub failed: bool,
    pub from: SmallVec<[String; 1]>,
    pub to: SmallVec<[String; 1]>,
    pub lock_info: Option<LockInfo>,
    pub conflicting_hash: Option<String>,
    pub memo: Option<String>,
    pub cursor: TransactionCursor,
}

impl TransactionRecord {
    /// Number of confirmations at the given chain height.
    pub fn confirmations(&self, last_block_height: u64) -> u64 {
        match self.block_height {
            Some(height) if last_block_height >= height => last_block_height - height + 1,
            _ => 0,
        }
    }

    pub fn is_confirmed(&self, last_block_height: u64) -> bool {
        self.confirmations(last_block_height) >= u64::from(self.confirmations_threshold)
    }
}

/// Height and time of the latest block the engine has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastBlockInfo {
    pub height: u64,
    #[serde(with = "time::serde::timestamp::option")]
    pub timestamp: Option<OffsetDateTime>,
}
