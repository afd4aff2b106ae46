//! Human-interface emulator contract.

use async_trait::async_trait;
use ipkvm_core::errors::ApiResult;
use serde_json::Value;

use crate::StateStream;

/// Keyboard/mouse emulation backend.
///
/// Input events are fire-and-forget from the API's perspective; the backend
/// owns delivery. `clear_events` must drop any still-pending input so a
/// disconnecting client cannot leave keys or buttons stuck down.
#[async_trait]
pub trait Hid: Send + Sync {
    /// Current state snapshot.
    async fn get_state(&self) -> Value;

    /// Live state sequence (infinite, not restartable).
    fn poll_state(&self) -> StateStream;

    /// Press or release a key.
    async fn send_key_event(&self, key: &str, state: bool) -> ApiResult<()>;

    /// Move the pointer to absolute coordinates.
    async fn send_mouse_move_event(&self, x: i32, y: i32) -> ApiResult<()>;

    /// Press or release a pointer button.
    async fn send_mouse_button_event(&self, button: &str, state: bool) -> ApiResult<()>;

    /// Scroll the wheel.
    async fn send_mouse_wheel_event(&self, delta_x: i32, delta_y: i32) -> ApiResult<()>;

    /// Drop all pending input events (releases held keys/buttons).
    async fn clear_events(&self);

    /// Reset the emulated devices.
    async fn reset(&self) -> ApiResult<()>;

    /// Release backend resources at shutdown.
    async fn cleanup(&self) -> ApiResult<()>;
}
