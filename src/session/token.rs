use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::models::SessionModel;
use super::types::SessionClaims;
use crate::config::usize_from_env;
use crate::shared::AppError;

const DEFAULT_SESSION_DAYS: usize = 7;
const MAX_SESSION_DAYS: usize = 365;

/// Signing keys and lifetime for guest session tokens (HS256)
#[derive(Clone)]
pub struct TokenConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
}

impl TokenConfig {
    /// Reads `JWT_SECRET` and `SESSION_EXPIRATION_DAYS` (default 7)
    pub fn new() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string());
        let days = usize_from_env(
            "SESSION_EXPIRATION_DAYS",
            DEFAULT_SESSION_DAYS,
            MAX_SESSION_DAYS,
        );

        Self::build(&secret, session_ttl_days(days))
    }

    /// Fixed secret and default lifetime, independent of the environment
    pub fn with_secret(secret: &str) -> Self {
        Self::build(secret, session_ttl_days(DEFAULT_SESSION_DAYS))
    }

    fn build(secret: &str, session_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            session_ttl,
        }
    }

    /// How long a freshly issued session stays valid
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Signs a token for `session`; it expires together with the stored session
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn create_token(&self, session: &SessionModel) -> Result<String, AppError> {
        let claims = SessionClaims {
            session_id: session.id.clone(),
            username: session.username.clone(),
            exp: session.expires_at.timestamp() as usize,
            iat: session.created_at.timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::JwtError(e.to_string())
        })
    }

    /// Checks signature and expiry and returns the embedded claims
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                debug!(error = %e, "Failed to decode JWT token");
                AppError::JwtError(e.to_string())
            },
        )?;

        debug!(
            username = %data.claims.username,
            session_id = %data.claims.session_id,
            "JWT token decoded"
        );
        Ok(data.claims)
    }
}

fn session_ttl_days(days: usize) -> Duration {
    i64::try_from(days.min(MAX_SESSION_DAYS))
        .ok()
        .and_then(Duration::try_days)
        .unwrap_or_else(|| Duration::days(DEFAULT_SESSION_DAYS as i64))
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}
