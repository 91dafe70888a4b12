use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use hoard_core::adapters::AdapterError;
use hoard_sdk::objects::Capability;
use hoard_sdk::objects::api::{TransactionsPage, TransactionsQuery, clamp_limit};

use super::{WalletApiError, find_wallet};
use crate::state::AppState;

/// `GET /wallets/{code}/transactions`: one page of transaction records.
///
/// Newest first. Pass the returned `next` cursor back as
/// `cursor_height`/`cursor_index` to get the following page.
pub(super) async fn list_transactions(
    state: State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<TransactionsQuery>,
) -> Result<impl IntoResponse, WalletApiError> {
    let wallet = find_wallet(&state, &code)?;
    let transactions = wallet
        .adapter
        .as_transactions()
        .ok_or(WalletApiError::NotSupported(Capability::Transactions))?;

    let cursor = query
        .cursor()
        .map_err(|e| AdapterError::InvalidParameter(e.to_string()))?;
    let limit = clamp_limit(query.limit);
    let records = transactions.transactions(cursor, limit);
    let next = if records.len() == limit {
        records.last().map(|r| r.cursor)
    } else {
        None
    };

    Ok(Json(TransactionsPage { records, next }))
}
