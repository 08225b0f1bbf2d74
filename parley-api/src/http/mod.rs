pub mod health;
pub mod turn;
pub mod websocket;

use axum::{routing::get, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::state::AppState;

/// Build the HTTP surface: health probe, TURN credentials, and the
/// signaling WebSocket endpoint.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health::health))
        .route("/turn-credentials", get(turn::turn_credentials))
        .route("/ws", get(websocket::websocket_handler))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_headers(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_headers(Any)
    }
}
