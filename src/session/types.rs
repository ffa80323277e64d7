use serde::{Deserialize, Serialize};

/// JWT claims structure containing session information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub session_id: String,
    pub username: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Response structure for session creation endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionResponse {
    pub session_id: String, // The JWT token
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_claims_serialization() {
        let claims = SessionClaims {
            session_id: "test-id".to_string(),
            username: "test-user".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("test-id"));
        assert!(json.contains("test-user"));

        let deserialized: SessionClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
