use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use hoard_sdk::objects::Capability;
use hoard_sdk::objects::api::ValidateAddressRequest;

use super::{WalletApiError, find_wallet};
use crate::state::AppState;

/// `POST /wallets/{code}/address/validate`: check a destination address.
///
/// Returns 204 if the address is usable, 400 otherwise.
pub(super) async fn validate_address(
    state: State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<ValidateAddressRequest>,
) -> Result<impl IntoResponse, WalletApiError> {
    let wallet = find_wallet(&state, &code)?;
    let sender = wallet
        .adapter
        .as_send()
        .ok_or(WalletApiError::NotSupported(Capability::Send))?;

    sender.validate_address(&payload.address)?;

    Ok(StatusCode::NO_CONTENT)
}
