use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::room::cleanup_task::CleanupConfig;
use crate::room::directory::RoomDirectory;
use crate::room::repository::RoomRepository;
use crate::session::service::SessionService;
use crate::user::service::UserService;
use crate::websockets::RoomHub;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
    pub user_service: Arc<UserService>,
    pub room_repository: Arc<dyn RoomRepository + Send + Sync>,
    /// Same store as `room_repository`, seen through the read-only status lookup
    pub room_directory: Arc<dyn RoomDirectory>,
    pub hub: RoomHub,
    pub cleanup_config: CleanupConfig,
}

impl AppState {
    pub fn new<R>(
        session_service: Arc<SessionService>,
        user_service: Arc<UserService>,
        room_repository: Arc<R>,
        hub: RoomHub,
        cleanup_config: CleanupConfig,
    ) -> Self
    where
        R: RoomRepository + RoomDirectory + Send + Sync + 'static,
    {
        Self {
            session_service,
            user_service,
            room_repository: room_repository.clone(),
            room_directory: room_repository,
            hub,
            cleanup_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Room unavailable: {0}")]
    RoomUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::RoomUnavailable(msg) => (StatusCode::GONE, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
