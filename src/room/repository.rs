use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::directory::{RoomDirectory, RoomStatus};
use super::models::{RoomModel, RoomState};
use crate::shared::AppError;

/// Result of attempting to store a new room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRoomResult {
    Created,
    /// Another room already uses this join code
    JoinCodeTaken,
}

/// Trait for room repository operations
#[async_trait]
pub trait RoomRepository {
    async fn create_room(&self, room: &RoomModel) -> Result<CreateRoomResult, AppError>;
    async fn get_room_by_join_code(&self, join_code: &str) -> Result<Option<RoomModel>, AppError>;

    /// Marks the room as ended; NotFound if no room uses `join_code`
    async fn end_room(&self, join_code: &str) -> Result<RoomModel, AppError>;
}

/// In-memory implementation of RoomRepository for development and testing
pub struct InMemoryRoomRepository {
    // join_code -> room
    rooms: Mutex<HashMap<String, RoomModel>>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn rooms(&self) -> std::sync::MutexGuard<'_, HashMap<String, RoomModel>> {
        self.rooms.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room))]
    async fn create_room(&self, room: &RoomModel) -> Result<CreateRoomResult, AppError> {
        let mut rooms = self.rooms();
        if rooms.contains_key(&room.join_code) {
            debug!(join_code = %room.join_code, "Join code already in use");
            return Ok(CreateRoomResult::JoinCodeTaken);
        }
        rooms.insert(room.join_code.clone(), room.clone());

        debug!(join_code = %room.join_code, creator = %room.creator, "Room created in memory");
        Ok(CreateRoomResult::Created)
    }

    #[instrument(skip(self))]
    async fn get_room_by_join_code(&self, join_code: &str) -> Result<Option<RoomModel>, AppError> {
        let room = self.rooms().get(join_code).cloned();

        if room.is_none() {
            debug!(join_code = %join_code, "Room not found in memory");
        }

        Ok(room)
    }

    #[instrument(skip(self))]
    async fn end_room(&self, join_code: &str) -> Result<RoomModel, AppError> {
        let mut rooms = self.rooms();
        let room = rooms.get_mut(join_code).ok_or_else(|| {
            warn!(join_code = %join_code, "Room not found for ending");
            AppError::NotFound("Room not found".to_string())
        })?;

        room.end();
        info!(join_code = %join_code, "Room marked as ended");

        Ok(room.clone())
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomRepository {
    async fn room_status(&self, join_code: &str) -> Result<Option<RoomStatus>, AppError> {
        Ok(self.rooms().get(join_code).map(RoomModel::room_status))
    }
}

/// PostgreSQL implementation of room repository
pub struct PostgresRoomRepository {
    pool: PgPool,
}

impl PostgresRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn room_from_row(row: &PgRow) -> Result<RoomModel, AppError> {
        let status: String = row.get("status");
        let status = RoomState::from_str(&status).map_err(|e: strum::ParseError| {
            AppError::DatabaseError(format!("invalid room status {status:?}: {e}"))
        })?;

        Ok(RoomModel {
            id: row.get("id"),
            name: row.get("name"),
            creator: row.get("creator"),
            join_code: row.get("join_code"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
            status,
        })
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    #[instrument(skip(self, room))]
    async fn create_room(&self, room: &RoomModel) -> Result<CreateRoomResult, AppError> {
        let result = sqlx::query(
            "INSERT INTO rooms (id, name, creator, join_code, created_at, expires_at, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (join_code) DO NOTHING",
        )
        .bind(&room.id)
        .bind(&room.name)
        .bind(&room.creator)
        .bind(&room.join_code)
        .bind(room.created_at)
        .bind(room.expires_at)
        .bind(room.status.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create room in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            debug!(join_code = %room.join_code, "Join code already in use");
            return Ok(CreateRoomResult::JoinCodeTaken);
        }

        Ok(CreateRoomResult::Created)
    }

    #[instrument(skip(self))]
    async fn get_room_by_join_code(&self, join_code: &str) -> Result<Option<RoomModel>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, creator, join_code, created_at, expires_at, status \
             FROM rooms WHERE join_code = $1",
        )
        .bind(join_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, join_code = %join_code, "Failed to fetch room from database");
            AppError::DatabaseError(e.to_string())
        })?;

        row.as_ref().map(Self::room_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn end_room(&self, join_code: &str) -> Result<RoomModel, AppError> {
        let row = sqlx::query(
            "UPDATE rooms SET status = $2 WHERE join_code = $1 \
             RETURNING id, name, creator, join_code, created_at, expires_at, status",
        )
        .bind(join_code)
        .bind(RoomState::Ended.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, join_code = %join_code, "Failed to end room in database");
            AppError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| AppError::NotFound("Room not found".to_string()))?;

        info!(join_code = %join_code, "Room marked as ended");
        Self::room_from_row(&row)
    }
}

#[async_trait]
impl RoomDirectory for PostgresRoomRepository {
    #[instrument(skip(self))]
    async fn room_status(&self, join_code: &str) -> Result<Option<RoomStatus>, AppError> {
        let row = sqlx::query("SELECT expires_at, status FROM rooms WHERE join_code = $1")
            .bind(join_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, join_code = %join_code, "Failed to look up room status");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(row.map(|row| {
            let status: String = row.get("status");
            RoomStatus {
                expires_at: row.get("expires_at"),
                // Anything other than a recognised ongoing status is not trusted as live
                ended: !matches!(RoomState::from_str(&status), Ok(RoomState::Ongoing)),
            }
        }))
    }
}
