//! Time-limited TURN credential endpoint.

use axum::{extract::State, http::StatusCode, Json};

use parley_core::service::TurnCredentials;

use crate::state::AppState;

pub async fn turn_credentials(
    State(state): State<AppState>,
) -> Result<Json<TurnCredentials>, (StatusCode, String)> {
    state
        .turn
        .generate()
        .map(Json)
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.ack_message()))
}
