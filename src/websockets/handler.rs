use axum::{
    extract::{ws::rejection::WebSocketUpgradeRejection, Query, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use futures::stream::StreamExt;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::shared::{AppError, AppState};

/// Query parameters of the upgrade request
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub join_code: String,
    /// Client identifier, unique within the room
    pub id: String,
}

/// WebSocket endpoint for joining a room's relay
/// GET /ws?join_code={code}&id={client_id}
///
/// The room is checked against the directory before upgrading; unknown rooms
/// get 404 and ended or expired rooms get 410.
#[instrument(name = "websocket_upgrade", skip(ws, state))]
pub async fn websocket_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let ConnectParams { join_code, id } = params;

    if join_code.is_empty() || id.is_empty() {
        warn!("Upgrade rejected, missing join code or client id");
        return Err(AppError::BadRequest(
            "join_code and id are required".to_string(),
        ));
    }

    ensure_room_is_live(&state, &join_code).await?;

    info!(
        room_id = %join_code,
        client_id = %id,
        "Room verified, establishing WebSocket connection"
    );

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!(room_id = %join_code, error = %rejection, "Request is not a WebSocket upgrade");
            return Ok(rejection.into_response());
        }
    };

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        hub.admit(join_code, id, Box::new(stream), Box::new(sink))
            .await;
    }))
}

/// Admission check: the room must exist, must not be ended and must not have expired
pub(crate) async fn ensure_room_is_live(state: &AppState, join_code: &str) -> Result<(), AppError> {
    let lookup_timeout = state.cleanup_config.lookup_timeout;
    let status = tokio::time::timeout(lookup_timeout, state.room_directory.room_status(join_code))
        .await
        .map_err(|_| {
            warn!(room_id = %join_code, "Room lookup timed out during admission");
            AppError::Internal
        })??;

    match status {
        None => {
            warn!(room_id = %join_code, "Room not found, rejecting WebSocket connection");
            Err(AppError::NotFound("Room not found".to_string()))
        }
        Some(status) if !status.is_live_at(Utc::now()) => {
            warn!(
                room_id = %join_code,
                ended = status.ended,
                expires_at = %status.expires_at,
                "Room is no longer live, rejecting WebSocket connection"
            );
            Err(AppError::RoomUnavailable(
                "Room has ended or expired".to_string(),
            ))
        }
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::directory::{RoomDirectory, RoomStatus};
    use crate::room::models::RoomModel;
    use crate::room::repository::{CreateRoomResult, InMemoryRoomRepository, RoomRepository};
    use crate::shared::test_utils::AppStateBuilder;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::Duration;
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    /// Room store whose database is unreachable
    struct OfflineRooms;

    #[async_trait]
    impl RoomRepository for OfflineRooms {
        async fn create_room(&self, _room: &RoomModel) -> Result<CreateRoomResult, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }

        async fn get_room_by_join_code(
            &self,
            _join_code: &str,
        ) -> Result<Option<RoomModel>, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }

        async fn end_room(&self, _join_code: &str) -> Result<RoomModel, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
    }

    #[async_trait]
    impl RoomDirectory for OfflineRooms {
        async fn room_status(&self, _join_code: &str) -> Result<Option<RoomStatus>, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
    }

    async fn app_with_room(room: Option<RoomModel>) -> Router {
        let repo = Arc::new(InMemoryRoomRepository::new());
        if let Some(room) = room {
            repo.create_room(&room).await.unwrap();
        }
        let state = AppStateBuilder::new().with_room_repository(repo).build();

        Router::new()
            .route("/ws", axum::routing::get(websocket_handler))
            .with_state(state)
    }

    fn upgrade_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .header("sec-websocket-version", "13")
            .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_room_is_rejected() {
        let app = app_with_room(None).await;

        let response = app
            .oneshot(upgrade_request("/ws?join_code=NOPE1&id=alice"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_expired_room_is_rejected() {
        let mut room = RoomModel::new(
            "standup".to_string(),
            "host".to_string(),
            Utc::now() + Duration::minutes(10),
        );
        room.join_code = "OLD01".to_string();
        room.expires_at = Utc::now() - Duration::minutes(1);
        let app = app_with_room(Some(room)).await;

        let response = app
            .oneshot(upgrade_request("/ws?join_code=OLD01&id=alice"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_ended_room_is_rejected() {
        let mut room = RoomModel::new(
            "standup".to_string(),
            "host".to_string(),
            Utc::now() + Duration::minutes(10),
        );
        room.join_code = "DONE1".to_string();
        room.end();
        let app = app_with_room(Some(room)).await;

        let response = app
            .oneshot(upgrade_request("/ws?join_code=DONE1&id=alice"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_missing_client_id_is_rejected() {
        let app = app_with_room(None).await;

        let response = app
            .oneshot(upgrade_request("/ws?join_code=ABCDE&id="))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_live_room_reaches_upgrade() {
        let mut room = RoomModel::new(
            "standup".to_string(),
            "host".to_string(),
            Utc::now() + Duration::minutes(10),
        );
        room.join_code = "LIVE1".to_string();
        let app = app_with_room(Some(room)).await;

        let response = app
            .oneshot(upgrade_request("/ws?join_code=LIVE1&id=alice"))
            .await
            .unwrap();

        // Admission passed; without a real connection the upgrade itself is refused
        assert_eq!(response.status(), StatusCode::UPGRADE_REQUIRED);
    }

    #[tokio::test]
    async fn test_live_room_passes_admission_check() {
        let mut room = RoomModel::new(
            "standup".to_string(),
            "host".to_string(),
            Utc::now() + Duration::minutes(10),
        );
        room.join_code = "LIVE1".to_string();
        let repo = Arc::new(InMemoryRoomRepository::new());
        repo.create_room(&room).await.unwrap();
        let state = AppStateBuilder::new().with_room_repository(repo).build();

        assert!(ensure_room_is_live(&state, "LIVE1").await.is_ok());
        assert!(matches!(
            ensure_room_is_live(&state, "OTHER").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_failure_is_server_error() {
        let state = AppStateBuilder::new()
            .with_room_repository(Arc::new(OfflineRooms))
            .build();
        let app = Router::new()
            .route("/ws", axum::routing::get(websocket_handler))
            .with_state(state);

        let response = app
            .oneshot(upgrade_request("/ws?join_code=ABCDE&id=alice"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
