use std::time::Duration;

use labrpc::{anyhow::Result, serde_json};
use serde::{Deserialize, Serialize};
use viewservice::PING_INTERVAL;

/// Timing used by servers and clerks.
///
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delay between two view service pings of a server.
    pub ping_interval_ms: u64,
    /// Delay before a clerk retries a failed request.
    pub retry_interval_ms: u64,
    /// Bound on a single RPC, forwards included.
    pub rpc_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ping_interval_ms: PING_INTERVAL.as_millis() as u64,
            retry_interval_ms: PING_INTERVAL.as_millis() as u64,
            rpc_timeout_ms: 500,
        }
    }
}

impl Config {
    /// Parse a JSON document, e.g. `{"ping_interval_ms": 20}`.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// See [Config::ping_interval_ms].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// See [Config::retry_interval_ms].
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// See [Config::rpc_timeout_ms].
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
