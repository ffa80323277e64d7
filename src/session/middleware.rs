use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// JWT authentication middleware - validates Authorization Bearer header and adds SessionClaims to request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<SessionClaims>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!(uri = %req.uri(), "Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = match state.session_service.validate_session(token).await {
        Ok(claims) => claims,
        Err(AppError::JwtError(e)) => {
            warn!(error = %e, "JWT authentication failed");
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }
        Err(e) => {
            warn!(error = %e, "JWT authentication failed");
            return Err(e);
        }
    };

    debug!(
        username = %claims.username,
        session_id = %claims.session_id,
        "Authentication successful"
    );

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
