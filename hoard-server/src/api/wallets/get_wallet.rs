use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use hoard_sdk::objects::api::WalletDetailResponse;

use super::{WalletApiError, find_wallet};
use crate::state::AppState;

/// `GET /wallets/{code}`: balances and sync detail of one wallet.
///
/// Fields whose capability the adapter lacks are `null`.
pub(super) async fn get_wallet(
    state: State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, WalletApiError> {
    let wallet = find_wallet(&state, &code)?;
    let adapter = &wallet.adapter;
    let balance = adapter.as_balance();

    Ok(Json(WalletDetailResponse {
        asset: wallet.asset.clone(),
        adapter_id: adapter.id(),
        state: adapter.state(),
        balance: balance.map(|b| b.balance()),
        locked_balance: balance.and_then(|b| b.locked_balance()),
        available_balance: balance.map(|b| b.available_balance()),
        receive_address: adapter.as_deposit().map(|d| d.receive_address()),
        last_block: adapter
            .as_transactions()
            .and_then(|t| t.last_block_info()),
        counters: adapter.counters(),
    }))
}
