use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{RoomModel, RoomState};

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
pub struct RoomCreateRequest {
    pub name: String,
    /// Minutes until the room expires, must be positive
    pub expire_minutes: i64,
}

/// Request payload for looking up a room before opening a socket
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub join_code: String,
    pub visitor_id: String,
}

/// Response for room creation and room information
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomResponse {
    pub join_code: String,
    pub name: String,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: RoomState,
}

impl From<RoomModel> for RoomResponse {
    fn from(room: RoomModel) -> Self {
        Self {
            join_code: room.join_code,
            name: room.name,
            creator: room.creator,
            created_at: room.created_at,
            expires_at: room.expires_at,
            status: room.status,
        }
    }
}
