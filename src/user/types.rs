use serde::{Deserialize, Serialize};

use super::models::UserModel;

/// Request payload for creating an account
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request payload for logging in with an account
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of an account
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub avatar: String,
}

impl From<UserModel> for ProfileResponse {
    fn from(user: UserModel) -> Self {
        Self {
            username: user.username,
            email: user.email,
            avatar: user.avatar,
        }
    }
}
