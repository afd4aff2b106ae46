//! In-memory ATX power-control unit.

use async_trait::async_trait;
use ipkvm_core::errors::ApiResult;
use ipkvm_core::types::{AtxButton, AtxPowerAction};
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::StateCell;
use crate::{Atx, StateStream};

/// Loopback power-control unit tracking a single power rail.
pub struct MemoryAtx {
    power: Mutex<bool>,
    cell: StateCell,
}

impl MemoryAtx {
    /// Create a unit with the machine powered off.
    pub fn new() -> Self {
        Self {
            power: Mutex::new(false),
            cell: StateCell::new(Self::snapshot(false)),
        }
    }

    fn snapshot(power: bool) -> Value {
        json!({
            "enabled": true,
            "busy": false,
            "leds": {"power": power, "hdd": false},
        })
    }

    fn set_power(&self, on: bool) -> bool {
        let mut power = self.power.lock();
        let changed = *power != on;
        *power = on;
        self.cell.set(Self::snapshot(on));
        changed
    }
}

impl Default for MemoryAtx {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Atx for MemoryAtx {
    async fn get_state(&self) -> Value {
        self.cell.get()
    }

    fn poll_state(&self) -> StateStream {
        self.cell.stream()
    }

    async fn power(&self, action: AtxPowerAction) -> ApiResult<bool> {
        let changed = match action {
            AtxPowerAction::On | AtxPowerAction::ResetHard => self.set_power(true),
            AtxPowerAction::Off | AtxPowerAction::OffHard => self.set_power(false),
        };
        Ok(changed)
    }

    async fn click(&self, button: AtxButton) -> ApiResult<()> {
        match button {
            AtxButton::Power => {
                let current = *self.power.lock();
                let _ = self.set_power(!current);
            }
            AtxButton::PowerLong => {
                let _ = self.set_power(false);
            }
            AtxButton::Reset => {
                // Momentary; no rail change to record.
            }
        }
        Ok(())
    }

    async fn cleanup(&self) -> ApiResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn power_on_reports_processing_once() {
        let atx = MemoryAtx::new();
        assert!(atx.power(AtxPowerAction::On).await.unwrap());
        // Already on: nothing to process.
        assert!(!atx.power(AtxPowerAction::On).await.unwrap());
        let state = atx.get_state().await;
        assert_eq!(state["leds"]["power"], true);
    }

    #[tokio::test]
    async fn click_power_toggles() {
        let atx = MemoryAtx::new();
        atx.click(AtxButton::Power).await.unwrap();
        assert_eq!(atx.get_state().await["leds"]["power"], true);
        atx.click(AtxButton::Power).await.unwrap();
        assert_eq!(atx.get_state().await["leds"]["power"], false);
    }

    #[tokio::test]
    async fn power_long_forces_off() {
        let atx = MemoryAtx::new();
        let _ = atx.power(AtxPowerAction::On).await.unwrap();
        atx.click(AtxButton::PowerLong).await.unwrap();
        assert_eq!(atx.get_state().await["leds"]["power"], false);
    }
}
