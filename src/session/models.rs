use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for guest sessions table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SessionModel {
    pub id: String,       // UUID v4 as string
    pub username: String, // Auto-generated pet name
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionModel {
    /// New session valid for `ttl` from now
    pub fn new(username: String, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            username,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
