//! Appliance info aggregation.

use axum::extract::State;
use serde_json::{Value, json};

use crate::response::{ApiResponse, ok};
use crate::server::AppState;

/// Compose the aggregate info snapshot. Shared between `GET /info` and the
/// WebSocket full-state replay.
pub async fn info_state(state: &AppState) -> Value {
    json!({
        "version": {
            "kvmd": env!("CARGO_PKG_VERSION"),
            "streamer": state.streamer.version().await,
        },
        "streamer": state.streamer.app(),
        "meta": state.info.meta().await,
        "extras": state.info.extras().await,
    })
}

/// `GET /info`.
pub async fn get_info(State(state): State<AppState>) -> ApiResponse {
    Ok(ok(info_state(&state).await))
}
