use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Result of attempting to store a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateUserResult {
    Created,
    UsernameTaken,
}

/// Trait for user account storage
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> Result<CreateUserResult, AppError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError>;

    /// Stamps the account's last successful login
    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> Result<(), AppError>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    // username -> user
    users: Mutex<HashMap<String, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }

    fn users(&self) -> std::sync::MutexGuard<'_, HashMap<String, UserModel>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: &UserModel) -> Result<CreateUserResult, AppError> {
        let mut users = self.users();
        if users.contains_key(&user.username) {
            debug!("Username already registered");
            return Ok(CreateUserResult::UsernameTaken);
        }
        users.insert(user.username.clone(), user.clone());

        debug!("User created in memory");
        Ok(CreateUserResult::Created)
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        Ok(self.users().get(username).cloned())
    }

    #[instrument(skip(self))]
    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        match self.users().get_mut(username) {
            Some(user) => {
                user.last_login_at = Some(at);
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: &UserModel) -> Result<CreateUserResult, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, avatar, created_at, last_login_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (username) DO NOTHING",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create user in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            debug!("Username already registered");
            return Ok(CreateUserResult::UsernameTaken);
        }

        Ok(CreateUserResult::Created)
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
        sqlx::query_as::<_, UserModel>(
            "SELECT id, username, email, password_hash, avatar, created_at, last_login_at \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, username = %username, "Failed to fetch user from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn record_login(&self, username: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE username = $1")
            .bind(username)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, username = %username, "Failed to record login");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }
}
