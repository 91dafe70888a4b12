use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use hoard_sdk::objects::Capability;
use hoard_sdk::objects::api::{SendRequest, SendResponse};

use super::{WalletApiError, find_wallet};
use crate::state::AppState;

/// `POST /wallets/{code}/send`: send funds to an address.
///
/// The address is validated first; the engine's verdict on the send itself
/// comes back as 502 when it rejects the transaction.
pub(super) async fn send(
    state: State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<SendRequest>,
) -> Result<impl IntoResponse, WalletApiError> {
    let wallet = find_wallet(&state, &code)?;
    let sender = wallet
        .adapter
        .as_send()
        .ok_or(WalletApiError::NotSupported(Capability::Send))?;

    sender.validate_address(&payload.address)?;
    sender
        .send(payload.amount, &payload.address, payload.memo.as_deref())
        .await?;

    tracing::info!(asset = %wallet.asset, amount = %payload.amount, "Send submitted");

    Ok(Json(SendResponse {
        asset: wallet.asset.clone(),
        amount: payload.amount,
        address: payload.address,
    }))
}
