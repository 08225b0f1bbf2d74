//! WebSocket handshake.
//!
//! The bearer token travels in the `Authorization` header (preferred) or the
//! `?token=` query parameter (browser fallback). Verification happens before
//! the upgrade; a connection without a valid identity never dispatches an
//! event.

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;

use parley_core::service::Claims;

use crate::signaling::handle_socket;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Bearer token fallback for browser clients. Note: tokens in URLs can
    /// end up in logs and history; the header is preferred.
    pub token: Option<String>,
}

fn extract_claims(
    state: &AppState,
    headers: &HeaderMap,
    query: &WsQuery,
) -> Result<Claims, String> {
    if let Some(auth_header) = headers.get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return state
                    .verifier
                    .verify(token)
                    .map_err(|e| e.ack_message());
            }
        }
    }

    if let Some(ref token) = query.token {
        return state.verifier.verify(token).map_err(|e| e.ack_message());
    }

    Err("Missing authentication: provide a bearer token".to_string())
}

pub async fn websocket_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let claims = match extract_claims(&state, &headers, &query) {
        Ok(claims) => claims,
        Err(message) => {
            warn!(error = %message, "Rejected signaling handshake");
            return (StatusCode::UNAUTHORIZED, message).into_response();
        }
    };

    // Signaling frames are small; 64 KiB is generous for SDP blobs
    ws.max_message_size(64 * 1024)
        .on_upgrade(move |socket| handle_socket(socket, state, claims))
        .into_response()
}
