use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument};

use super::types::{LoginRequest, ProfileResponse, RegisterRequest};
use crate::session::{SessionClaims, SessionResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating an account
///
/// POST /auth/register
#[instrument(name = "register", skip(state, request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    let profile = state.user_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// HTTP handler for logging in
///
/// POST /auth/login
/// Returns the same token shape as a guest session
#[instrument(name = "login", skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.user_service.login(request).await?;

    Ok(Json(session))
}

/// HTTP handler for the caller's account profile
///
/// GET /profile (requires jwt_auth)
#[instrument(name = "profile", skip(state, claims))]
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.user_service.profile(&claims.username).await?;

    info!(username = %profile.username, "Profile served");
    Ok(Json(profile))
}
