//! # ipkvm-backends
//!
//! Capability contracts for the hardware collaborators the control plane
//! schedules and fans out state for:
//!
//! - [`Hid`] — human-interface (keyboard/mouse) emulator
//! - [`Atx`] — power-control unit
//! - [`Msd`] — mass-storage emulator, with an exclusive [`MsdHandle`] claim
//! - [`StreamerClient`] — external video streamer
//! - [`AuthBackend`] — credential/token validation
//! - [`LogSource`] — log tail backend
//! - [`InfoSource`] — version/meta aggregation
//!
//! Every device trait exposes `get_state()` (snapshot) and `poll_state()`
//! (infinite, non-restartable live sequence). The [`memory`] module holds
//! in-process reference implementations used by the daemon binary and the
//! integration tests; real hardware drivers live outside this repo.

#![deny(unsafe_code)]

pub mod atx;
pub mod auth;
pub mod hid;
pub mod info;
pub mod log;
pub mod memory;
pub mod msd;
pub mod streamer;

pub use atx::Atx;
pub use auth::AuthBackend;
pub use hid::Hid;
pub use info::InfoSource;
pub use log::LogSource;
pub use msd::{Msd, MsdClaim, MsdHandle};
pub use streamer::StreamerClient;

/// Infinite live sequence of state snapshots produced by `poll_state()`.
pub type StateStream = futures::stream::BoxStream<'static, serde_json::Value>;
