//! Graceful shutdown coordination via `CancellationToken`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Coordinates graceful shutdown across all server tasks.
///
/// Shutdown has two flavors: requested (signal, API) and fault-initiated
/// (a supervised task died). Both cancel the same token; the fault flag is
/// kept so the process can exit non-zero and get restarted by its
/// supervisor.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    faulted: AtomicBool,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            faulted: AtomicBool::new(false),
        }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate a requested shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Initiate a fault shutdown (a task that must never stop has stopped).
    pub fn fault(&self) {
        self.faulted.store(true, Ordering::Relaxed);
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the shutdown was fault-initiated.
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Relaxed)
    }

    /// Perform a graceful shutdown of all tracked tasks.
    ///
    /// 1. Cancel the shutdown token (signals all tasks)
    /// 2. Wait up to `timeout` for all handles to complete
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Duration) {
        self.shutdown();
        info!(
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "waiting for system tasks"
        );

        let drain = futures::future::join_all(handles);
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("shutdown timed out after {timeout:?}, some tasks may still be running");
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
