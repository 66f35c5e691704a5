//! Domain models for streaming-range-api.

use serde::Serialize;
use std::fmt;

/// Result of a live database probe as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    /// No connection could be acquired, or no probe was attempted.
    Disconnected,
    /// A connection was acquired but the liveness query failed.
    Error,
}

impl DatabaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseStatus::Connected => "connected",
            DatabaseStatus::Disconnected => "disconnected",
            DatabaseStatus::Error => "error",
        }
    }
}

impl fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
