use std::time::Duration;

/// Process-level settings read once at startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// When set, rooms and sessions are stored in PostgreSQL
    pub database_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
        }
    }
}

/// Longest duration any `*_SECS` setting may take (one year)
pub(crate) const MAX_ENV_SECS: u64 = 365 * 24 * 60 * 60;

/// Reads a whole number of seconds from `name`, falling back to `default`.
/// Values above `MAX_ENV_SECS` are clamped to it.
pub(crate) fn secs_from_env(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(secs.min(MAX_ENV_SECS)))
        .unwrap_or(default)
}

/// Reads a positive count from `name`, clamped to `max`
pub(crate) fn usize_from_env(name: &str, default: usize, max: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map(|n| n.min(max))
        .unwrap_or(default)
}
