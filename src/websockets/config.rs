use std::time::Duration;

use crate::config::{secs_from_env, usize_from_env};

const MAX_OUTBOUND_CAPACITY: usize = 65_536;

/// Timing and buffering limits for every hub connection
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Pending messages a connection may hold before it is evicted as a slow consumer
    pub outbound_capacity: usize,
    /// How long a connection may stay silent before it is dropped (reset by pongs)
    pub read_timeout: Duration,
    /// Upper bound for a single frame write
    pub write_timeout: Duration,
    /// How often keep-alive pings are sent
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            read_timeout: Duration::from_secs(5 * 60), // 5 minutes
            write_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl HubConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            outbound_capacity: usize_from_env(
                "HUB_OUTBOUND_CAPACITY",
                defaults.outbound_capacity,
                MAX_OUTBOUND_CAPACITY,
            ),
            read_timeout: secs_from_env("HUB_READ_TIMEOUT_SECS", defaults.read_timeout),
            write_timeout: secs_from_env("HUB_WRITE_TIMEOUT_SECS", defaults.write_timeout),
            ping_interval: secs_from_env("HUB_PING_INTERVAL_SECS", defaults.ping_interval),
        }
    }
}
