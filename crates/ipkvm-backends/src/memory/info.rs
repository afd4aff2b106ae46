//! In-memory appliance metadata.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::InfoSource;

/// Fixed metadata provided at construction.
pub struct MemoryInfo {
    meta: Value,
    extras: Value,
}

impl MemoryInfo {
    /// Create with explicit meta/extras documents.
    pub fn new(meta: Value, extras: Value) -> Self {
        Self { meta, extras }
    }
}

impl Default for MemoryInfo {
    fn default() -> Self {
        Self::new(
            json!({"server": {"host": "localhost"}}),
            json!({}),
        )
    }
}

#[async_trait]
impl InfoSource for MemoryInfo {
    async fn meta(&self) -> Value {
        self.meta.clone()
    }

    async fn extras(&self) -> Value {
        self.extras.clone()
    }
}
