use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::AppError;

/// Liveness information the hub needs about a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomStatus {
    pub expires_at: DateTime<Utc>,
    pub ended: bool,
}

impl RoomStatus {
    /// A room is live while it is not ended and its expiry lies strictly in the future
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        !self.ended && self.expires_at > now
    }
}

/// Read-only room lookup used on upgrade and by the sweeper
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Ok(None) when no room is registered under `join_code`
    async fn room_status(&self, join_code: &str) -> Result<Option<RoomStatus>, AppError>;
}
