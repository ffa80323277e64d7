use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar";

/// Database model for users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt, never sent to clients
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserModel {
    /// New account whose avatar is derived from `email`
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let avatar = gravatar_url(&email);

        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            avatar,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }
}

/// Gravatar image for `email`, keyed by the md5 of its trimmed lowercase form
pub fn gravatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    format!("{GRAVATAR_BASE}/{:x}", md5::compute(normalized.as_bytes()))
}
