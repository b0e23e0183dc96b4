//! Client options.

use crate::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for [`LiveClient`](crate::LiveClient) and
/// [`DiskClient`](crate::DiskClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Upper bound on each wait for the writer's data-ready signal.
    pub data_ready_timeout_ms: u64,
    /// Upper bound on the wait before a freeze snapshot is taken.
    pub freeze_timeout_ms: u64,
    /// Decode session info sections on tokio's blocking pool.
    pub background_session_decode: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { data_ready_timeout_ms: 32, freeze_timeout_ms: 32, background_session_decode: false }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from YAML; missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| TelemetryError::Parse {
            context: "client options".to_string(),
            details: e.to_string(),
        })
    }

    pub fn with_data_ready_timeout(mut self, timeout: Duration) -> Self {
        self.data_ready_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_freeze_timeout(mut self, timeout: Duration) -> Self {
        self.freeze_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_background_session_decode(mut self, enabled: bool) -> Self {
        self.background_session_decode = enabled;
        self
    }

    pub fn data_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.data_ready_timeout_ms)
    }

    pub fn freeze_timeout(&self) -> Duration {
        Duration::from_millis(self.freeze_timeout_ms)
    }
}
