//! Appliance meta-info contract.

use async_trait::async_trait;
use serde_json::Value;

/// Source of static appliance metadata for `GET /info`.
#[async_trait]
pub trait InfoSource: Send + Sync {
    /// Deployment metadata (location, rack, server name, …).
    async fn meta(&self) -> Value;

    /// Extra UI/application descriptors.
    async fn extras(&self) -> Value;
}
