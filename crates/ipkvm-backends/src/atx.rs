//! Power-control unit contract.

use async_trait::async_trait;
use ipkvm_core::errors::ApiResult;
use ipkvm_core::types::{AtxButton, AtxPowerAction};
use serde_json::Value;

use crate::StateStream;

/// ATX power-control backend.
///
/// Actions may fail `Busy` (an operation is already in flight) or
/// `Operation` (the unit rejected the action in its current state).
#[async_trait]
pub trait Atx: Send + Sync {
    /// Current state snapshot.
    async fn get_state(&self) -> Value;

    /// Live state sequence (infinite, not restartable).
    fn poll_state(&self) -> StateStream;

    /// Drive a power-rail action. Returns whether the action is still
    /// being processed asynchronously by the unit.
    async fn power(&self, action: AtxPowerAction) -> ApiResult<bool>;

    /// Click a front-panel button.
    async fn click(&self, button: AtxButton) -> ApiResult<()>;

    /// Release backend resources at shutdown.
    async fn cleanup(&self) -> ApiResult<()>;
}
