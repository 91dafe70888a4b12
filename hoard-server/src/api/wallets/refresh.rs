use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::state::AppState;

/// `POST /wallets/refresh`: kick every adapter, e.g. after a connection loss.
pub(super) async fn refresh_wallets(state: State<AppState>) -> impl IntoResponse {
    state.wallets.refresh_all().await;
    StatusCode::NO_CONTENT
}
