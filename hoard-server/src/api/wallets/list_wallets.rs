use axum::{Json, extract::State, response::IntoResponse};
use hoard_sdk::objects::api::WalletResponse;

use super::to_response;
use crate::state::AppState;

/// `GET /wallets`: list the wallets of the current snapshot.
pub(super) async fn list_wallets(state: State<AppState>) -> impl IntoResponse {
    let response: Vec<WalletResponse> = state.wallets.wallets().iter().map(to_response).collect();

    Json(response)
}
