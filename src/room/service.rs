use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::RoomModel,
    repository::{CreateRoomResult, RoomRepository},
    types::{JoinRoomRequest, RoomCreateRequest, RoomResponse},
};
use crate::shared::AppError;

/// Fresh join codes tried before giving up on creating a room
const MAX_JOIN_CODE_ATTEMPTS: usize = 5;

/// Moment a room created now expires, or 400 if `expire_minutes` is not a usable lifetime
fn expiry_after(expire_minutes: i64) -> Result<DateTime<Utc>, AppError> {
    if expire_minutes <= 0 {
        return Err(AppError::BadRequest(
            "expire_minutes must be greater than zero".to_string(),
        ));
    }

    Duration::try_minutes(expire_minutes)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| AppError::BadRequest("expire_minutes is out of range".to_string()))
}

/// Service for handling room business logic
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Creates a new room owned by `creator`, retrying on join code collisions
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        creator: &str,
        request: RoomCreateRequest,
    ) -> Result<RoomResponse, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Room name cannot be empty".to_string()));
        }
        let expires_at = expiry_after(request.expire_minutes)?;

        for attempt in 1..=MAX_JOIN_CODE_ATTEMPTS {
            let room = RoomModel::new(name.to_string(), creator.to_string(), expires_at);

            match self.repository.create_room(&room).await? {
                CreateRoomResult::Created => {
                    info!(
                        join_code = %room.join_code,
                        creator = %room.creator,
                        expires_at = %room.expires_at,
                        "Room created successfully"
                    );
                    return Ok(room.into());
                }
                CreateRoomResult::JoinCodeTaken => {
                    debug!(attempt, join_code = %room.join_code, "Join code collision, retrying");
                }
            }
        }

        warn!(
            attempts = MAX_JOIN_CODE_ATTEMPTS,
            "Could not find a free join code"
        );
        Err(AppError::Internal)
    }

    /// Looks up a live room for a visitor about to open a socket
    #[instrument(skip(self))]
    pub async fn join_room(&self, request: JoinRoomRequest) -> Result<RoomResponse, AppError> {
        let room = self
            .repository
            .get_room_by_join_code(&request.join_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

        if !room.room_status().is_live_at(Utc::now()) {
            info!(
                join_code = %room.join_code,
                visitor_id = %request.visitor_id,
                status = %room.status,
                "Rejected join for ended or expired room"
            );
            return Err(AppError::RoomUnavailable(format!(
                "Room {} is no longer available",
                room.join_code
            )));
        }

        info!(
            join_code = %room.join_code,
            visitor_id = %request.visitor_id,
            "Visitor joined room"
        );
        Ok(room.into())
    }

    /// Ends a room; only its creator may do so
    #[instrument(skip(self))]
    pub async fn end_room(&self, join_code: &str, username: &str) -> Result<RoomResponse, AppError> {
        let room = self
            .repository
            .get_room_by_join_code(join_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

        if room.creator != username {
            warn!(
                join_code = %join_code,
                username = %username,
                creator = %room.creator,
                "Non-creator attempted to end room"
            );
            return Err(AppError::Forbidden(
                "Only the room creator can end the room".to_string(),
            ));
        }

        let room = self.repository.end_room(join_code).await?;
        Ok(room.into())
    }
}
