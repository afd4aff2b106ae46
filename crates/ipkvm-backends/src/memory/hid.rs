//! In-memory HID emulator.

use std::collections::BTreeSet;

use async_trait::async_trait;
use ipkvm_core::errors::ApiResult;
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::StateCell;
use crate::{Hid, StateStream};

#[derive(Default)]
struct HidInner {
    pressed_keys: BTreeSet<String>,
    pressed_buttons: BTreeSet<String>,
    mouse_x: i32,
    mouse_y: i32,
}

impl HidInner {
    fn snapshot(&self) -> Value {
        json!({
            "online": true,
            "keyboard": {"pressed": self.pressed_keys.iter().collect::<Vec<_>>()},
            "mouse": {
                "x": self.mouse_x,
                "y": self.mouse_y,
                "pressed": self.pressed_buttons.iter().collect::<Vec<_>>(),
            },
        })
    }
}

/// Loopback keyboard/mouse emulator.
pub struct MemoryHid {
    inner: Mutex<HidInner>,
    cell: StateCell,
}

impl MemoryHid {
    /// Create an emulator with nothing pressed.
    pub fn new() -> Self {
        let inner = HidInner::default();
        let cell = StateCell::new(inner.snapshot());
        Self {
            inner: Mutex::new(inner),
            cell,
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut HidInner)) {
        let mut inner = self.inner.lock();
        f(&mut inner);
        self.cell.set(inner.snapshot());
    }
}

impl Default for MemoryHid {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hid for MemoryHid {
    async fn get_state(&self) -> Value {
        self.cell.get()
    }

    fn poll_state(&self) -> StateStream {
        self.cell.stream()
    }

    async fn send_key_event(&self, key: &str, state: bool) -> ApiResult<()> {
        self.mutate(|inner| {
            if state {
                let _ = inner.pressed_keys.insert(key.to_owned());
            } else {
                let _ = inner.pressed_keys.remove(key);
            }
        });
        Ok(())
    }

    async fn send_mouse_move_event(&self, x: i32, y: i32) -> ApiResult<()> {
        self.mutate(|inner| {
            inner.mouse_x = x;
            inner.mouse_y = y;
        });
        Ok(())
    }

    async fn send_mouse_button_event(&self, button: &str, state: bool) -> ApiResult<()> {
        self.mutate(|inner| {
            if state {
                let _ = inner.pressed_buttons.insert(button.to_owned());
            } else {
                let _ = inner.pressed_buttons.remove(button);
            }
        });
        Ok(())
    }

    async fn send_mouse_wheel_event(&self, _delta_x: i32, _delta_y: i32) -> ApiResult<()> {
        // Wheel events carry no persistent state.
        Ok(())
    }

    async fn clear_events(&self) {
        self.mutate(|inner| {
            inner.pressed_keys.clear();
            inner.pressed_buttons.clear();
        });
    }

    async fn reset(&self) -> ApiResult<()> {
        self.mutate(|inner| *inner = HidInner::default());
        Ok(())
    }

    async fn cleanup(&self) -> ApiResult<()> {
        self.clear_events().await;
        Ok(())
    }
}
