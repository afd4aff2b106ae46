//! WebSocket session registry and per-session state.

mod registry;
mod session;

pub use registry::SessionRegistry;
pub use session::{SESSION_QUEUE_DEPTH, Session};
