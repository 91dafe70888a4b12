//! HTTP API request and response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::assets::{Asset, Capability};
use super::records::{LastBlockInfo, TransactionCursor, TransactionRecord};
use super::state::AdapterState;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// One entry of the wallet list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub asset: Asset,
    pub adapter_id: Uuid,
    pub state: AdapterState,
    pub capabilities: Vec<Capability>,
}

/// Balance and sync detail for a single wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletDetailResponse {
    pub asset: Asset,
    pub adapter_id: Uuid,
    pub state: AdapterState,
    pub balance: Option<Decimal>,
    pub locked_balance: Option<Decimal>,
    pub available_balance: Option<Decimal>,
    pub receive_address: Option<String>,
    pub last_block: Option<LastBlockInfo>,
    pub counters: AdapterCounters,
}

/// Observability counters of one adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterCounters {
    pub notifications: u64,
    pub state_changes: u64,
    pub records_emitted: u64,
    pub sends_succeeded: u64,
    pub sends_failed: u64,
}

/// A page of transaction records.
///
/// `next` is the cursor to pass back to get the following page; it is
/// absent once the page came back short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionsPage {
    pub records: Vec<TransactionRecord>,
    pub next: Option<TransactionCursor>,
}

/// Result of a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub asset: Asset,
    pub amount: Decimal,
    pub address: String,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 200;

/// Query parameters for listing transactions.
///
/// The cursor is split into flat fields so it fits in a query string.
/// `cursor_index` without `cursor_height` addresses a pending record;
/// `cursor_height` alone is rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub cursor_height: Option<u64>,
    pub cursor_index: Option<u64>,
}

/// `cursor_height` was given without `cursor_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cursor_height requires cursor_index")]
pub struct IncompleteCursor;

impl TransactionsQuery {
    pub fn cursor(&self) -> Result<Option<TransactionCursor>, IncompleteCursor> {
        match (self.cursor_height, self.cursor_index) {
            (Some(_), None) => Err(IncompleteCursor),
            (block_height, index) => Ok(index.map(|index| TransactionCursor {
                block_height,
                index,
            })),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub amount: Decimal,
    pub address: String,
    #[serde(default)]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateAddressRequest {
    pub address: String,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Clamp a page size to a safe range.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(50), 50);
        assert_eq!(clamp_limit(10_000), MAX_LIMIT);
    }

    #[test]
    fn test_query_cursor() {
        let query = TransactionsQuery {
            limit: DEFAULT_LIMIT,
            cursor_height: Some(100),
            cursor_index: Some(3),
        };
        assert_eq!(query.cursor(), Ok(Some(TransactionCursor::confirmed(100, 3))));

        let query = TransactionsQuery {
            limit: DEFAULT_LIMIT,
            cursor_height: None,
            cursor_index: Some(7),
        };
        assert_eq!(query.cursor(), Ok(Some(TransactionCursor::pending(7))));

        let query = TransactionsQuery {
            limit: DEFAULT_LIMIT,
            cursor_height: Some(100),
            cursor_index: None,
        };
        assert_eq!(query.cursor(), Err(IncompleteCursor));

        let query = TransactionsQuery {
            limit: DEFAULT_LIMIT,
            cursor_height: None,
            cursor_index: None,
        };
        assert_eq!(query.cursor(), Ok(None));
    }
}
