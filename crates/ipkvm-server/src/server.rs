//! Control-plane assembly: shared state, router, task set, run loop.

use std::sync::Arc;
use std::time::Duration;

use ipkvm_backends::{Atx, AuthBackend, Hid, InfoSource, LogSource, MsdHandle, StreamerClient};
use ipkvm_core::StreamerParams;
use ipkvm_core::events::StateEvent;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes;
use crate::shutdown::ShutdownCoordinator;
use crate::streamer_ctl::{self, StreamerControl};
use crate::tasks::{run_session_reaper, run_state_poller, spawn_system_task};
use crate::ws::SessionRegistry;

/// The device and service backends the control plane drives.
pub struct Collaborators {
    /// Keyboard/mouse emulator.
    pub hid: Arc<dyn Hid>,
    /// Power control unit.
    pub atx: Arc<dyn Atx>,
    /// Mass-storage emulator, behind its exclusive claim.
    pub msd: Arc<MsdHandle>,
    /// Video streamer process client.
    pub streamer: Arc<dyn StreamerClient>,
    /// Credential backend.
    pub auth: Arc<dyn AuthBackend>,
    /// Log tail source.
    pub log: Arc<dyn LogSource>,
    /// Appliance metadata source.
    pub info: Arc<dyn InfoSource>,
}

/// Shared handler state, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Effective server configuration.
    pub config: Arc<ServerConfig>,
    /// Keyboard/mouse emulator.
    pub hid: Arc<dyn Hid>,
    /// Power control unit.
    pub atx: Arc<dyn Atx>,
    /// Mass-storage handle.
    pub msd: Arc<MsdHandle>,
    /// Video streamer client.
    pub streamer: Arc<dyn StreamerClient>,
    /// Credential backend.
    pub auth: Arc<dyn AuthBackend>,
    /// Log tail source.
    pub log: Arc<dyn LogSource>,
    /// Appliance metadata source.
    pub info: Arc<dyn InfoSource>,
    /// Attached WebSocket clients.
    pub registry: Arc<SessionRegistry>,
    /// Streamer desired-state knobs.
    pub control: Arc<StreamerControl>,
    /// Daemon-wide shutdown handle.
    pub shutdown: Arc<ShutdownCoordinator>,
}

impl AppState {
    /// Assemble shared state around a collaborator set.
    pub fn new(config: ServerConfig, collaborators: Collaborators) -> Self {
        Self {
            config: Arc::new(config),
            hid: collaborators.hid,
            atx: collaborators.atx,
            msd: collaborators.msd,
            streamer: collaborators.streamer,
            auth: collaborators.auth,
            log: collaborators.log,
            info: collaborators.info,
            registry: Arc::new(SessionRegistry::new()),
            control: Arc::new(StreamerControl::new(StreamerParams::default())),
            shutdown: Arc::new(ShutdownCoordinator::new()),
        }
    }
}

/// The HTTP/WebSocket control plane.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Build a server over assembled state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Shared state handle, for signal wiring and tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The full route table with the auth gate applied.
    pub fn router(&self) -> axum::Router {
        routes::build_router(self.state.clone())
    }

    /// Spawn the fixed system task set: streamer lifecycle controller plus
    /// one state poller per device domain.
    pub fn spawn_system_tasks(&self) -> Vec<JoinHandle<()>> {
        let state = &self.state;
        let shutdown = &state.shutdown;
        let poll_interval = Duration::from_millis(state.config.poll_interval_ms);

        let mut handles = Vec::new();
        handles.push(spawn_system_task(
            "streamer-controller",
            Arc::clone(shutdown),
            streamer_ctl::run_controller(
                Arc::clone(&state.control),
                Arc::clone(&state.registry),
                Arc::clone(&state.streamer),
                poll_interval,
                shutdown.token(),
            ),
        ));
        handles.push(spawn_system_task(
            "session-reaper",
            Arc::clone(shutdown),
            run_session_reaper(
                poll_interval,
                Arc::clone(&state.registry),
                Arc::clone(&state.hid),
            ),
        ));
        let pollers = [
            ("hid-poller", StateEvent::HidState, state.hid.poll_state()),
            ("atx-poller", StateEvent::AtxState, state.atx.poll_state()),
            (
                "msd-poller",
                StateEvent::MsdState,
                state.msd.device().poll_state(),
            ),
            (
                "streamer-poller",
                StateEvent::StreamerState,
                state.streamer.poll_state(),
            ),
        ];
        for (name, event, stream) in pollers {
            handles.push(spawn_system_task(
                name,
                Arc::clone(shutdown),
                run_state_poller(
                    event,
                    stream,
                    Arc::clone(&state.registry),
                    Arc::clone(&state.hid),
                ),
            ));
        }
        handles
    }

    /// Serve until shutdown is requested, then tear everything down in
    /// order: HTTP, system tasks, client sessions, collaborators.
    pub async fn run(&self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %listener.local_addr()?, "control plane listening");

        let tasks = self.spawn_system_tasks();
        let token = self.state.shutdown.token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(token.cancelled_owned())
            .await?;

        let timeout = Duration::from_secs(self.state.config.shutdown_timeout_secs);
        self.state.shutdown.graceful_shutdown(tasks, timeout).await;
        let _ = self.state.registry.close_all();
        self.cleanup_collaborators().await;
        info!("control plane stopped");
        Ok(())
    }

    /// Best-effort collaborator cleanup; failures are logged, never fatal.
    async fn cleanup_collaborators(&self) {
        let state = &self.state;
        if let Err(err) = state.hid.cleanup().await {
            warn!(%err, "hid cleanup failed");
        }
        if let Err(err) = state.atx.cleanup().await {
            warn!(%err, "atx cleanup failed");
        }
        if let Err(err) = state.msd.device().cleanup().await {
            warn!(%err, "msd cleanup failed");
        }
        if let Err(err) = state.streamer.cleanup().await {
            warn!(%err, "streamer cleanup failed");
        }
        state.auth.cleanup().await;
    }
}
