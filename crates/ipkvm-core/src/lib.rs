//! # ipkvm-core
//!
//! Shared types for the ipkvm control plane:
//!
//! - [`errors::ApiError`] — the API-facing error taxonomy and its HTTP mapping
//! - [`validators`] — request input validation
//! - [`params::StreamerParams`] — desired/actual streamer configuration
//! - [`events`] — WebSocket wire envelopes and state-event names
//! - [`types`] — small domain enums shared across crates

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod params;
pub mod types;
pub mod validators;

pub use errors::{ApiError, ApiResult};
pub use params::StreamerParams;
