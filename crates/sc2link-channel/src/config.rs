//! Channel configuration.

use std::time::Duration;

use sc2link_transport::Endpoint;
use serde::{Deserialize, Serialize};

/// The request path the engine serves its API on.
pub const DEFAULT_PATH: &str = "/sc2api";

/// Everything the channel needs to know, read once at construction.
///
/// The connection manager keeps its own copy; changing a config after the
/// channel is built has no effect on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Engine host name or IP.
    pub host: String,

    /// Engine port.
    pub port: u16,

    /// Request path on the engine. Default: `/sc2api`.
    pub path: String,

    /// Connection attempts allowed per (re)connect cycle. The budget is
    /// refilled after every successful connect. `0` means the channel
    /// never tries and is unavailable from the start.
    pub retry_attempts: u32,

    /// Largest single frame, in bytes, in either direction.
    pub max_frame_size: usize,

    /// Upper bound on one connection attempt. An attempt that runs over
    /// counts as a failed attempt.
    pub connect_timeout: Duration,

    /// Fixed pause between failed attempts.
    pub retry_backoff: Duration,

    /// Random extra pause, up to this much, added to `retry_backoff`.
    pub retry_jitter: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            path: DEFAULT_PATH.to_string(),
            retry_attempts: 10,
            max_frame_size: 2 * 1024 * 1024,
            connect_timeout: Duration::from_secs(5),
            retry_backoff: Duration::from_millis(100),
            retry_jitter: Duration::from_millis(50),
        }
    }
}

impl ChannelConfig {
    /// Default settings pointed at `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port, self.path.clone())
    }
}
