//! Streamer lifecycle controller.
//!
//! A 100 ms tick loop that starts the streamer when the first client
//! attaches, stops it once the last client has been gone longer than the
//! streamer's grace delay, and restarts it without full re-init whenever
//! the desired parameters drift from the applied ones or a reset has been
//! requested. Changes landing and reverting inside one tick window are
//! deliberately invisible to it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ipkvm_backends::StreamerClient;
use ipkvm_core::StreamerParams;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ws::SessionRegistry;

/// Shared knobs the HTTP API turns and the controller loop reads.
#[derive(Debug)]
pub struct StreamerControl {
    desired: Mutex<StreamerParams>,
    reset: AtomicBool,
}

impl StreamerControl {
    /// Start from the given desired parameters, reset unarmed.
    pub fn new(desired: StreamerParams) -> Self {
        Self {
            desired: Mutex::new(desired),
            reset: AtomicBool::new(false),
        }
    }

    /// Current desired parameters.
    pub fn desired(&self) -> StreamerParams {
        *self.desired.lock()
    }

    /// Replace the desired parameters.
    pub fn set_desired(&self, params: StreamerParams) {
        *self.desired.lock() = params;
    }

    /// Arm a forced restart. Stays armed until the controller performs one.
    pub fn request_reset(&self) {
        self.reset.store(true, Ordering::Relaxed);
    }

    /// Whether a restart is pending.
    pub fn reset_armed(&self) -> bool {
        self.reset.load(Ordering::Relaxed)
    }

    fn clear_reset(&self) {
        self.reset.store(false, Ordering::Relaxed);
    }
}

/// Drive the streamer until `token` is cancelled.
pub async fn run_controller(
    control: Arc<StreamerControl>,
    registry: Arc<SessionRegistry>,
    streamer: Arc<dyn StreamerClient>,
    poll_interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    let mut prev: usize = 0;
    // None behaves as "expired", so a streamer found running with no
    // clients at startup is stopped on the first tick.
    let mut shutdown_at: Option<Instant> = None;

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let cur = registry.len();
        if prev == 0 && cur > 0 {
            if !streamer.is_running() {
                info!("first client attached, starting streamer");
                if let Err(err) = streamer.start(control.desired(), false).await {
                    warn!(%err, "streamer start failed");
                }
            }
        } else if prev > 0 && cur == 0 {
            let grace = streamer.shutdown_delay();
            debug!(?grace, "last client detached, arming streamer shutdown");
            shutdown_at = Some(Instant::now() + grace);
        } else if prev == 0
            && cur == 0
            && streamer.is_running()
            && shutdown_at.is_none_or(|at| Instant::now() > at)
        {
            info!("shutdown grace elapsed, stopping streamer");
            if let Err(err) = streamer.stop().await {
                warn!(%err, "streamer stop failed");
            }
        }

        if streamer.is_running() {
            let desired = control.desired();
            if control.reset_armed() || streamer.params() != desired {
                info!(quality = desired.quality, fps = desired.desired_fps,
                    "restarting streamer with current parameters");
                if let Err(err) = streamer.stop().await {
                    warn!(%err, "streamer stop failed");
                }
                if let Err(err) = streamer.start(desired, true).await {
                    warn!(%err, "streamer restart failed");
                }
                control.clear_reset();
            }
        }

        prev = cur;
    }
}
