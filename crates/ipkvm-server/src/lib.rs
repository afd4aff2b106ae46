//! # ipkvm-server
//!
//! The control plane of the ipkvm appliance:
//!
//! - Axum router with explicit per-operation registration and an auth gate
//!   on the protected subset
//! - `{"ok": ...}` JSON response envelope with the fixed error/status table
//! - WebSocket session registry with full-state replay and best-effort
//!   event broadcast
//! - Supervised system tasks (state pollers, dead-session reaper, streamer
//!   lifecycle controller); any unexpected task exit shuts the server down
//! - Chunked multipart upload into the mass-storage collaborator under its
//!   exclusive claim
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod response;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod streamer_ctl;
pub mod tasks;
pub mod ws;

pub use config::ServerConfig;
pub use server::{Collaborators, Server};
