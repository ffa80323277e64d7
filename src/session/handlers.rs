use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument};

use super::types::{SessionClaims, SessionResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new guest session
///
/// POST /session
/// Returns a JWT token as session_id and generated username
#[instrument(name = "create_session", skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.session_service.create_session().await?;

    info!(username = %session.username, "Session issued");

    Ok(Json(session))
}

/// HTTP handler for ending the caller's session
///
/// DELETE /session (requires jwt_auth)
#[instrument(name = "end_session", skip(state, claims))]
pub async fn end_session(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<StatusCode, AppError> {
    state
        .session_service
        .revoke_session(&claims.session_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
