use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, instrument};

use super::directory::RoomDirectory;
use crate::config::secs_from_env;
use crate::websockets::RoomHub;

/// Configuration for the room sweeper
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often the hub's rooms are checked against the directory
    pub sweep_interval: Duration,
    /// Upper bound for a single directory lookup
    pub lookup_timeout: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            lookup_timeout: Duration::from_secs(2),
        }
    }
}

impl CleanupConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            sweep_interval: secs_from_env("ROOM_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            lookup_timeout: secs_from_env("ROOM_LOOKUP_TIMEOUT_SECS", defaults.lookup_timeout),
        }
    }
}

/// Starts the background sweeper that disconnects rooms which are gone, ended or expired.
/// Runs for the lifetime of the process; the first pass happens one interval after start.
#[instrument(skip(hub, directory))]
pub async fn start_cleanup_task(
    hub: RoomHub,
    directory: Arc<dyn RoomDirectory>,
    config: CleanupConfig,
) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        lookup_timeout_secs = config.lookup_timeout.as_secs(),
        "Starting room sweeper background task"
    );

    let mut ticker = interval_at(Instant::now() + config.sweep_interval, config.sweep_interval);

    loop {
        ticker.tick().await;
        sweep_rooms(&hub, directory.as_ref(), config.lookup_timeout).await;
    }
}

/// Runs one sweep pass and returns how many rooms were evicted
async fn sweep_rooms(hub: &RoomHub, directory: &dyn RoomDirectory, lookup_timeout: Duration) -> usize {
    debug!("Running room sweep");

    let evicted = hub.sweep(directory, lookup_timeout).await;

    if evicted.is_empty() {
        debug!("No rooms to evict");
    } else {
        info!(count = evicted.len(), rooms = ?evicted, "Room sweep completed");
    }

    evicted.len()
}
