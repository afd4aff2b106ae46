//! KVM-over-IP control-plane daemon.
//!
//! Wires the in-memory reference backends into the HTTP/WebSocket control
//! plane, handles SIGINT/SIGTERM, and exits non-zero when shutdown was
//! triggered by a faulted system task so a process supervisor restarts it.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ipkvm_backends::memory::{
    MemoryAtx, MemoryAuth, MemoryHid, MemoryInfo, MemoryLog, MemoryMsd, MemoryStreamer,
};
use ipkvm_backends::{Msd, MsdHandle};
use ipkvm_server::config::load_config;
use ipkvm_server::server::{AppState, Collaborators, Server};
use ipkvm_server::shutdown::ShutdownCoordinator;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Grace period before an unwatched streamer is stopped.
const STREAMER_SHUTDOWN_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "ipkvmd", version, about = "KVM-over-IP control-plane daemon")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind host, overriding the config file.
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overriding the config file.
    #[arg(long)]
    port: Option<u16>,

    /// Admin username for the built-in auth backend.
    #[arg(long, default_value = "admin")]
    user: String,

    /// Admin password for the built-in auth backend.
    #[arg(long, default_value = "admin")]
    passwd: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn make_collaborators(cli: &Cli, log: Arc<MemoryLog>) -> Collaborators {
    let msd: Arc<dyn Msd> = Arc::new(MemoryMsd::new());
    Collaborators {
        hid: Arc::new(MemoryHid::new()),
        atx: Arc::new(MemoryAtx::new()),
        msd: Arc::new(MsdHandle::new(msd)),
        streamer: Arc::new(MemoryStreamer::new(STREAMER_SHUTDOWN_DELAY)),
        auth: Arc::new(MemoryAuth::single(&cli.user, &cli.passwd)),
        log,
        info: Arc::new(MemoryInfo::new(
            json!({"server": {"name": "ipkvmd"}}),
            json!({}),
        )),
    }
}

fn spawn_signal_watcher(shutdown: Arc<ShutdownCoordinator>) {
    let _ = tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(err) => {
                    error!(%err, "failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
                _ = sigterm.recv() => info!("SIGTERM received"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received");
        }
        shutdown.shutdown();
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.host.clone() {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let log = Arc::new(MemoryLog::new());
    log.push("ipkvmd", "daemon starting");
    let state = AppState::new(config, make_collaborators(&cli, log));
    spawn_signal_watcher(Arc::clone(&state.shutdown));

    let server = Server::new(state.clone());
    server.run().await?;

    if state.shutdown.is_faulted() {
        error!("shutdown was fault-initiated, exiting non-zero");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
