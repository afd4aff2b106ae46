//! In-process reference backends.
//!
//! These keep their whole state in memory and feed `poll_state()` from a
//! watch channel on every mutation. They exist so the daemon runs
//! end-to-end without hardware and so integration tests exercise real
//! collaborator behavior (busy claims, state fan-out, upload transactions).

mod atx;
mod auth;
mod hid;
mod info;
mod log;
mod msd;
mod state_cell;
mod streamer;

pub use atx::MemoryAtx;
pub use auth::MemoryAuth;
pub use hid::MemoryHid;
pub use info::MemoryInfo;
pub use log::MemoryLog;
pub use msd::MemoryMsd;
pub use streamer::MemoryStreamer;

pub(crate) use state_cell::StateCell;
