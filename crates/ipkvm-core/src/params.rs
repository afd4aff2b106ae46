//! Streamer parameter set.
//!
//! Two copies exist at runtime: the server's *desired* parameters (mutated
//! by `POST /streamer/set_params`) and the streamer's *actual* last-applied
//! parameters. The lifecycle controller restarts the stream when they
//! diverge.

use serde::{Deserialize, Serialize};

/// Encoder parameters applied when (re)starting the streamer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerParams {
    /// JPEG quality, 1..=100.
    pub quality: u32,
    /// Desired frame rate, 0..=120 (0 = unlimited).
    pub desired_fps: u32,
}

impl Default for StreamerParams {
    fn default() -> Self {
        Self {
            quality: 80,
            desired_fps: 30,
        }
    }
}
