//! Wallet API handlers.
//!
//! These endpoints are called by the UI layer. They read from the current
//! wallet snapshot and go through each adapter's capability accessors.
//!
//! # Endpoints
//!
//! - `GET  /wallets`                           – list tracked wallets
//! - `POST /wallets/refresh`                   – refresh every adapter
//! - `GET  /wallets/{code}`                    – balances and sync detail
//! - `GET  /wallets/{code}/transactions`       – paginated transaction records
//! - `POST /wallets/{code}/address/validate`   – check a destination address
//! - `POST /wallets/{code}/send`               – send funds

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use hoard_core::adapters::AdapterError;
use hoard_core::wallets::Wallet;
use hoard_sdk::objects::Capability;
use hoard_sdk::objects::api::WalletResponse;

use crate::state::AppState;

mod get_wallet;
mod list_transactions;
mod list_wallets;
mod refresh;
mod send;
mod validate_address;

/// Build the Wallet API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wallets", get(list_wallets::list_wallets))
        .route("/wallets/refresh", post(refresh::refresh_wallets))
        .route("/wallets/{code}", get(get_wallet::get_wallet))
        .route(
            "/wallets/{code}/transactions",
            get(list_transactions::list_transactions),
        )
        .route(
            "/wallets/{code}/address/validate",
            post(validate_address::validate_address),
        )
        .route("/wallets/{code}/send", post(send::send))
}

/// Convert a registry `Wallet` into a `WalletResponse` (API model).
fn to_response(wallet: &Wallet) -> WalletResponse {
    WalletResponse {
        asset: wallet.asset.clone(),
        adapter_id: wallet.adapter.id(),
        state: wallet.adapter.state(),
        capabilities: wallet.adapter.capabilities(),
    }
}

/// Look up a tracked wallet by asset code.
fn find_wallet(state: &AppState, code: &str) -> Result<Wallet, WalletApiError> {
    state.wallets.wallet(code).ok_or(WalletApiError::NotFound)
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Wallet API handlers.
#[derive(Debug)]
enum WalletApiError {
    /// No tracked wallet has this asset code.
    NotFound,
    /// The wallet's adapter lacks the capability the endpoint needs.
    NotSupported(Capability),
    /// The adapter rejected the operation.
    Adapter(AdapterError),
}

impl From<AdapterError> for WalletApiError {
    fn from(e: AdapterError) -> Self {
        WalletApiError::Adapter(e)
    }
}

impl IntoResponse for WalletApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            WalletApiError::NotFound => (StatusCode::NOT_FOUND, "wallet not found").into_response(),
            WalletApiError::NotSupported(capability)
            | WalletApiError::Adapter(AdapterError::NotSupported(capability)) => (
                StatusCode::CONFLICT,
                format!("wallet does not support {capability:?}"),
            )
                .into_response(),
            WalletApiError::Adapter(AdapterError::InvalidParameter(message)) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            WalletApiError::Adapter(AdapterError::UnsupportedAccount) => (
                StatusCode::CONFLICT,
                "account cannot be used for this operation",
            )
                .into_response(),
            WalletApiError::Adapter(AdapterError::SendFailure(message)) => {
                tracing::warn!(%message, "Send failed");
                (StatusCode::BAD_GATEWAY, message).into_response()
            }
            WalletApiError::Adapter(AdapterError::Connection) => {
                (StatusCode::SERVICE_UNAVAILABLE, "no connection").into_response()
            }
            WalletApiError::Adapter(e) => {
                tracing::error!(error = %e, "Wallet API adapter error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
