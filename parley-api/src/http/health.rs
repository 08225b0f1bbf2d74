//! Health probe.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub rooms: usize,
    pub workers: usize,
    pub uptime: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rooms: state.rooms.room_count(),
        workers: state.workers.worker_count(),
        uptime: state.uptime_seconds(),
    })
}
