//! Notification WebSocket endpoint

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
};
use tracing::warn;

use crate::notify::serve_socket;
use crate::AppState;

/// GET /ws/updates
///
/// Unauthenticated. After the handshake the connection is registered and
/// receives every broadcast until it closes.
pub async fn updates_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let registry = state.registry.clone();
    ws.on_failed_upgrade(|e| warn!("Notification handshake failed: {}", e))
        .on_upgrade(move |socket| serve_socket(registry, socket))
}
