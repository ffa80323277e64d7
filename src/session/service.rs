use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    generators::{PetNameUsernameGenerator, UsernameGenerator},
    models::SessionModel,
    repository::SessionRepository,
    token::TokenConfig,
    types::{SessionClaims, SessionResponse},
};
use crate::shared::AppError;

/// Service for handling guest session business logic
pub struct SessionService {
    repository: Arc<dyn SessionRepository + Send + Sync>,
    username_generator: Arc<dyn UsernameGenerator>,
    token_config: TokenConfig,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            username_generator: Arc::new(PetNameUsernameGenerator::new()),
            token_config,
        }
    }

    /// Creates a new session with a generated username and JWT token
    #[instrument(skip(self))]
    pub async fn create_session(&self) -> Result<SessionResponse, AppError> {
        let username = self.username_generator.generate().await;
        self.start_session(username).await
    }

    /// Records a session for `username` and signs its token.
    /// Used for guests and for account logins alike.
    #[instrument(skip(self))]
    pub async fn start_session(&self, username: String) -> Result<SessionResponse, AppError> {
        let session = SessionModel::new(username, self.token_config.session_ttl());

        self.repository.create_session(&session).await?;

        let token = self.token_config.create_token(&session)?;

        info!(
            session_id = %session.id,
            username = %session.username,
            "Session created"
        );

        Ok(SessionResponse {
            session_id: token,
            username: session.username,
        })
    }

    /// Validates a session token and returns the claims if the session is still on record
    #[instrument(skip(self, token))]
    pub async fn validate_session(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims = self.token_config.validate_token(token)?;

        match self.repository.get_session(&claims.session_id).await? {
            Some(session) if session.is_expired() => {
                warn!(session_id = %claims.session_id, "Session has expired");
                Err(AppError::Unauthorized("Session has expired".to_string()))
            }
            Some(_) => Ok(claims),
            None => {
                warn!(
                    session_id = %claims.session_id,
                    "Session not found - may have been revoked"
                );
                Err(AppError::Unauthorized(
                    "Session not found or has been revoked".to_string(),
                ))
            }
        }
    }

    /// Revokes a session by removing it from the store
    #[instrument(skip(self))]
    pub async fn revoke_session(&self, session_id: &str) -> Result<(), AppError> {
        self.repository.delete_session(session_id).await?;
        info!(session_id = %session_id, "Session revoked");
        Ok(())
    }
}
