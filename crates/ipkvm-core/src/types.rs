//! Small domain enums and records shared across crates.

use serde::{Deserialize, Serialize};

/// ATX power-rail actions accepted by `POST /atx/power`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtxPowerAction {
    /// Power the machine on.
    On,
    /// Soft power-off (short press semantics on the backend).
    Off,
    /// Hard power-off (long press / rail cut).
    OffHard,
    /// Hard reset.
    ResetHard,
}

/// Front-panel buttons accepted by `POST /atx/click`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtxButton {
    /// Short power button press.
    Power,
    /// Long power button press.
    PowerLong,
    /// Reset button press.
    Reset,
}

/// One record from the log-tailing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Formatted timestamp (`YYYY-MM-DD HH:MM:SS`).
    pub dt: String,
    /// Originating service name.
    pub service: String,
    /// Message text.
    pub msg: String,
}

impl LogRecord {
    /// Render the record as one plain-text tail line.
    pub fn to_line(&self) -> String {
        format!("[{} {}] --- {}\r\n", self.dt, self.service, self.msg)
    }
}
