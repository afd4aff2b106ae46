//! Supervised background tasks.
//!
//! Every system task is expected to run until shutdown. A task that returns
//! on its own, or panics, means the daemon has lost a capability it cannot
//! operate without, so the supervisor records a fault and triggers a full
//! graceful shutdown instead of limping along.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::stream::StreamExt;
use ipkvm_backends::{Hid, StateStream};
use ipkvm_core::events::StateEvent;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::shutdown::ShutdownCoordinator;
use crate::ws::SessionRegistry;

/// How a supervised task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Ended because shutdown was requested.
    Cancelled,
    /// Ran to completion on its own, which system tasks never should.
    Completed,
    /// Panicked.
    Faulted,
}

/// Run `fut` under supervision, classifying how it ends.
pub async fn supervise<F>(name: &str, shutdown: &ShutdownCoordinator, fut: F) -> TaskOutcome
where
    F: Future<Output = ()>,
{
    let token = shutdown.token();
    tokio::select! {
        () = token.cancelled() => {
            info!(task = name, "task cancelled by shutdown");
            TaskOutcome::Cancelled
        }
        result = AssertUnwindSafe(fut).catch_unwind() => match result {
            Ok(()) => {
                error!(task = name, "system task exited unexpectedly");
                TaskOutcome::Completed
            }
            Err(_) => {
                error!(task = name, "system task panicked");
                TaskOutcome::Faulted
            }
        },
    }
}

/// Spawn a system task. Any ending other than cancellation faults the whole
/// daemon.
pub fn spawn_system_task<F>(
    name: &'static str,
    shutdown: Arc<ShutdownCoordinator>,
    fut: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        match supervise(name, &shutdown, fut).await {
            TaskOutcome::Cancelled => {}
            TaskOutcome::Completed | TaskOutcome::Faulted => shutdown.fault(),
        }
    })
}

/// Forward one collaborator's state stream to every attached client.
///
/// The stream is infinite by contract, so returning means the collaborator
/// died; under supervision that ends the daemon. Sessions dropped during a
/// broadcast get their pending input cleared so no key stays held down.
pub async fn run_state_poller(
    event: StateEvent,
    mut stream: StateStream,
    registry: Arc<SessionRegistry>,
    hid: Arc<dyn Hid>,
) {
    while let Some(state) = stream.next().await {
        if !registry.broadcast(event, &state).is_empty() {
            hid.clear_events().await;
        }
    }
}

/// Periodically drop sessions whose socket writer died without a clean
/// detach, clearing pending input when any are found.
pub async fn run_session_reaper(
    interval: Duration,
    registry: Arc<SessionRegistry>,
    hid: Arc<dyn Hid>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        let _ = ticker.tick().await;
        if !registry.reap_closed().is_empty() {
            hid.clear_events().await;
        }
    }
}
