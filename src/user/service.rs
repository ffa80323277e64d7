use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::UserModel,
    repository::{CreateUserResult, UserRepository},
    types::{LoginRequest, ProfileResponse, RegisterRequest},
};
use crate::session::service::SessionService;
use crate::session::SessionResponse;
use crate::shared::AppError;

const USERNAME_LENGTH: std::ops::RangeInclusive<usize> = 3..=32;
const PASSWORD_LENGTH: std::ops::RangeInclusive<usize> = 8..=72; // bcrypt reads 72 bytes at most

/// Service for account registration, login and profiles
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    sessions: Arc<SessionService>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository + Send + Sync>,
        sessions: Arc<SessionService>,
        hash_cost: u32,
    ) -> Self {
        Self {
            repository,
            sessions,
            hash_cost,
        }
    }

    /// Creates an account with a bcrypt password hash and a gravatar avatar
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<ProfileResponse, AppError> {
        validate_username(&request.username)?;
        let email = request.email.trim();
        validate_email(email)?;
        if !PASSWORD_LENGTH.contains(&request.password.len()) {
            return Err(AppError::BadRequest(format!(
                "Password must be {} to {} bytes long",
                PASSWORD_LENGTH.start(),
                PASSWORD_LENGTH.end()
            )));
        }

        if self
            .repository
            .get_user_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(username_taken());
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = UserModel::new(request.username, email.to_string(), password_hash);

        match self.repository.create_user(&user).await? {
            CreateUserResult::Created => {
                info!(username = %user.username, "User registered");
                Ok(user.into())
            }
            // Lost a race with a concurrent registration
            CreateUserResult::UsernameTaken => Err(username_taken()),
        }
    }

    /// Checks the password and opens a session for the account
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<SessionResponse, AppError> {
        let user = self
            .repository
            .get_user_by_username(&request.username)
            .await?
            .ok_or_else(|| {
                warn!("Login for unknown username");
                invalid_credentials()
            })?;

        if !self.verify_password(request.password, user.password_hash).await? {
            warn!("Login with wrong password");
            return Err(invalid_credentials());
        }

        self.repository
            .record_login(&user.username, Utc::now())
            .await?;
        let session = self.sessions.start_session(user.username).await?;

        info!(username = %session.username, "User logged in");
        Ok(session)
    }

    /// Profile of the account behind `username`
    #[instrument(skip(self))]
    pub async fn profile(&self, username: &str) -> Result<ProfileResponse, AppError> {
        self.repository
            .get_user_by_username(username)
            .await?
            .map(ProfileResponse::from)
            .ok_or_else(|| AppError::NotFound("No account for this session".to_string()))
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| {
                warn!(error = %e, "Password hashing task failed");
                AppError::Internal
            })?
            .map_err(|e| {
                warn!(error = %e, "Failed to hash password");
                AppError::Internal
            })
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| {
                warn!(error = %e, "Password verification task failed");
                AppError::Internal
            })?
            .map_err(|e| {
                warn!(error = %e, "Stored password hash is unreadable");
                AppError::Internal
            })
    }
}

/// Account names never contain `-`, so they cannot collide with guest pet names
fn validate_username(username: &str) -> Result<(), AppError> {
    let well_formed = USERNAME_LENGTH.contains(&username.chars().count())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !well_formed {
        return Err(AppError::BadRequest(format!(
            "Username must be {} to {} letters, digits or underscores",
            USERNAME_LENGTH.start(),
            USERNAME_LENGTH.end()
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::BadRequest("Invalid email address".to_string())),
    }
}

fn username_taken() -> AppError {
    AppError::Conflict("Username already exists".to_string())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}
