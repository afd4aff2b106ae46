//! HID state and reset handlers. Input events ride the WebSocket, not HTTP.

use axum::extract::State;

use crate::response::{ApiResponse, ok, ok_empty};
use crate::server::AppState;

/// `GET /hid`.
pub async fn state(State(state): State<AppState>) -> ApiResponse {
    Ok(ok(state.hid.get_state().await))
}

/// `POST /hid/reset`.
pub async fn reset(State(state): State<AppState>) -> ApiResponse {
    state.hid.reset().await?;
    Ok(ok_empty())
}
