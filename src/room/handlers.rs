use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::RoomService,
    types::{JoinRoomRequest, RoomCreateRequest, RoomResponse},
};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /room (requires jwt_auth)
/// The caller's session username becomes the room's creator
#[instrument(name = "create_room", skip(state, claims))]
pub async fn create_room(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    info!(username = %claims.username, name = %request.name, "Creating new room");

    let service = RoomService::new(Arc::clone(&state.room_repository));
    let room = service.create_room(&claims.username, request).await?;

    Ok(Json(room))
}

/// HTTP handler for looking up a joinable room
///
/// POST /room/join
#[instrument(name = "join_room", skip(state))]
pub async fn join_room(
    State(state): State<AppState>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let service = RoomService::new(Arc::clone(&state.room_repository));
    let room = service.join_room(request).await?;

    Ok(Json(room))
}

/// HTTP handler for ending a room
///
/// POST /room/:join_code/end (requires jwt_auth)
/// Connected members are dropped by the next sweep
#[instrument(name = "end_room", skip(state, claims))]
pub async fn end_room(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(join_code): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let service = RoomService::new(Arc::clone(&state.room_repository));
    let room = service.end_room(&join_code, &claims.username).await?;

    info!(join_code = %join_code, username = %claims.username, "Room ended");

    Ok(Json(room))
}
