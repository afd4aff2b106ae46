//! Server configuration.
//!
//! Loading flow (layered sources):
//! 1. Compiled [`ServerConfig::default()`]
//! 2. JSON config file, deep-merged over defaults
//! 3. `IPKVM_*` environment variables (highest priority); invalid values
//!    are ignored rather than fatal

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Errors from config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON.
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for the control plane.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// WebSocket protocol-level ping interval in seconds.
    pub heartbeat_secs: u64,
    /// Chunk size for forwarding an image upload to the MSD, in bytes.
    pub sync_chunk_size: usize,
    /// Tick interval of the polling system tasks (reaper, streamer
    /// controller) in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum time to wait for system tasks during graceful shutdown.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            heartbeat_secs: 15,
            sync_chunk_size: 4 * 1024 * 1024, // 4 MiB
            poll_interval_ms: 100,
            shutdown_timeout_secs: 30,
        }
    }
}

/// Load config from an optional JSON file with env overrides.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let defaults = serde_json::to_value(ServerConfig::default())?;

    let merged = match path {
        Some(path) if path.exists() => {
            debug!(?path, "loading config from file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        }
        Some(path) => {
            debug!(?path, "config file not found, using defaults");
            defaults
        }
        None => defaults,
    };

    let mut config: ServerConfig = serde_json::from_value(merged)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Recursive deep merge of two JSON values.
///
/// Objects merge per-key, everything else is replaced by the source; null
/// source values are skipped so a file cannot erase a default.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

fn apply_env_overrides(config: &mut ServerConfig) {
    if let Ok(v) = std::env::var("IPKVM_HOST") {
        if !v.is_empty() {
            config.host = v;
        }
    }
    if let Some(v) = read_env_u64("IPKVM_PORT", 0, 65535) {
        #[allow(clippy::cast_possible_truncation)]
        {
            config.port = v as u16;
        }
    }
    if let Some(v) = read_env_u64("IPKVM_HEARTBEAT_SECS", 1, 3600) {
        config.heartbeat_secs = v;
    }
    if let Some(v) = read_env_u64("IPKVM_SYNC_CHUNK_SIZE", 1024, 256 * 1024 * 1024) {
        #[allow(clippy::cast_possible_truncation)]
        {
            config.sync_chunk_size = v as usize;
        }
    }
    if let Some(v) = read_env_u64("IPKVM_POLL_INTERVAL_MS", 10, 10_000) {
        config.poll_interval_ms = v;
    }
    if let Some(v) = read_env_u64("IPKVM_SHUTDOWN_TIMEOUT_SECS", 1, 600) {
        config.shutdown_timeout_secs = v;
    }
}

/// Strict env integer parsing. Out-of-range or malformed values are
/// ignored (fall back to file/default).
fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(v) if (min..=max).contains(&v) => Some(v),
        _ => None,
    }
}
