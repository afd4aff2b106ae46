//! Video streamer client contract.

use std::time::Duration;

use async_trait::async_trait;
use ipkvm_core::StreamerParams;
use ipkvm_core::errors::ApiResult;
use serde_json::Value;

use crate::StateStream;

/// Client for the external video streamer process.
///
/// The control plane never tracks "running" itself; it always asks the
/// streamer via [`StreamerClient::is_running`] so server and streamer state
/// cannot drift apart.
#[async_trait]
pub trait StreamerClient: Send + Sync {
    /// Current state snapshot.
    async fn get_state(&self) -> Value;

    /// Live state sequence (infinite, not restartable).
    fn poll_state(&self) -> StateStream;

    /// Parameters last applied by a `start`.
    fn params(&self) -> StreamerParams;

    /// Liveness query against the streamer itself.
    fn is_running(&self) -> bool;

    /// Start the streamer with the given parameters. `no_init_restart`
    /// skips the expensive full initialization path on a parameter-only
    /// restart.
    async fn start(&self, params: StreamerParams, no_init_restart: bool) -> ApiResult<()>;

    /// Stop the streamer.
    async fn stop(&self) -> ApiResult<()>;

    /// Streamer version string, queried from the process.
    async fn version(&self) -> String;

    /// Name of the streamer application.
    fn app(&self) -> &str;

    /// Grace delay before a zero-connections condition stops the stream.
    fn shutdown_delay(&self) -> Duration;

    /// Release backend resources at shutdown.
    async fn cleanup(&self) -> ApiResult<()>;
}
