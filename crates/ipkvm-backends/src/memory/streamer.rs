//! In-memory video streamer client.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ipkvm_core::StreamerParams;
use ipkvm_core::errors::ApiResult;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::info;

use super::StateCell;
use crate::{StateStream, StreamerClient};

/// Loopback streamer tracking running state and last-applied parameters.
///
/// Exposes start/stop counters so lifecycle tests can assert exactly how
/// the controller drove it.
pub struct MemoryStreamer {
    running: AtomicBool,
    applied: Mutex<StreamerParams>,
    cell: StateCell,
    shutdown_delay: Duration,
    starts: AtomicU64,
    no_init_starts: AtomicU64,
    stops: AtomicU64,
}

impl MemoryStreamer {
    /// Create a stopped streamer with the given zero-connections grace delay.
    pub fn new(shutdown_delay: Duration) -> Self {
        let applied = StreamerParams::default();
        Self {
            running: AtomicBool::new(false),
            applied: Mutex::new(applied),
            cell: StateCell::new(Self::snapshot(false, applied)),
            shutdown_delay,
            starts: AtomicU64::new(0),
            no_init_starts: AtomicU64::new(0),
            stops: AtomicU64::new(0),
        }
    }

    fn snapshot(running: bool, params: StreamerParams) -> Value {
        json!({
            "app": "memstream",
            "running": running,
            "params": params,
        })
    }

    fn refresh(&self) {
        let running = self.running.load(Ordering::Relaxed);
        let params = *self.applied.lock();
        self.cell.set(Self::snapshot(running, params));
    }

    /// Total `start` calls.
    pub fn start_count(&self) -> u64 {
        self.starts.load(Ordering::Relaxed)
    }

    /// `start` calls that skipped full initialization.
    pub fn no_init_start_count(&self) -> u64 {
        self.no_init_starts.load(Ordering::Relaxed)
    }

    /// Total `stop` calls.
    pub fn stop_count(&self) -> u64 {
        self.stops.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StreamerClient for MemoryStreamer {
    async fn get_state(&self) -> Value {
        self.cell.get()
    }

    fn poll_state(&self) -> StateStream {
        self.cell.stream()
    }

    fn params(&self) -> StreamerParams {
        *self.applied.lock()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    async fn start(&self, params: StreamerParams, no_init_restart: bool) -> ApiResult<()> {
        info!(
            quality = params.quality,
            fps = params.desired_fps,
            no_init_restart,
            "streamer start"
        );
        *self.applied.lock() = params;
        self.running.store(true, Ordering::Relaxed);
        let _ = self.starts.fetch_add(1, Ordering::Relaxed);
        if no_init_restart {
            let _ = self.no_init_starts.fetch_add(1, Ordering::Relaxed);
        }
        self.refresh();
        Ok(())
    }

    async fn stop(&self) -> ApiResult<()> {
        info!("streamer stop");
        self.running.store(false, Ordering::Relaxed);
        let _ = self.stops.fetch_add(1, Ordering::Relaxed);
        self.refresh();
        Ok(())
    }

    async fn version(&self) -> String {
        "memstream/0.1".into()
    }

    fn app(&self) -> &str {
        "memstream"
    }

    fn shutdown_delay(&self) -> Duration {
        self.shutdown_delay
    }

    async fn cleanup(&self) -> ApiResult<()> {
        if self.is_running() { self.stop().await } else { Ok(()) }
    }
}
