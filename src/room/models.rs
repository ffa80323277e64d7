use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::directory::RoomStatus;
use super::join_code::generate_join_code;

/// Lifecycle of a room record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomState {
    Ongoing,
    Ended,
}

/// Database model for rooms table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    pub id: String,
    pub name: String,
    pub creator: String, // Username of the session that created the room
    pub join_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: RoomState,
}

impl RoomModel {
    /// Creates a new ongoing room with a fresh join code
    pub fn new(name: String, creator: String, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            creator,
            join_code: generate_join_code(),
            created_at: now,
            expires_at,
            status: RoomState::Ongoing,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.status == RoomState::Ended
    }

    pub fn end(&mut self) {
        self.status = RoomState::Ended;
    }

    pub fn room_status(&self) -> RoomStatus {
        RoomStatus {
            expires_at: self.expires_at,
            ended: self.is_ended(),
        }
    }
}
