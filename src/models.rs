use crate::router::PayrollPeriod;
use crate::session::TokenPair;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Numeric account id resolved from a session owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of `POST /api/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub user: String,
    pub pass: String,
    /// Accepted for client compatibility, not used for authorization
    #[serde(default)]
    pub role: Option<String>,
}

/// Body of `POST /api/refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    #[must_use]
    pub fn from_pair(pair: TokenPair, access_ttl: Duration) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: access_ttl.num_seconds(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub sessions: usize,
    pub grants: usize,
}

/// Body of `GET /api/me`
#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub owner: String,
    pub request_id: Uuid,
    pub payroll_period: Option<PayrollPeriod>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_login_request_role_is_optional() {
        let body: LoginRequest =
            serde_json::from_str(r#"{"user":"alice","pass":"secret"}"#).unwrap();
        assert_eq!(body.user, "alice");
        assert!(body.role.is_none());

        let body: LoginRequest =
            serde_json::from_str(r#"{"user":"alice","pass":"secret","role":"admin"}"#).unwrap();
        assert_eq!(body.role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_token_response_from_pair() {
        let now = Utc::now();
        let pair = TokenPair {
            access_token: "a".repeat(64),
            refresh_token: "r".repeat(64),
            access_expires_at: now + Duration::minutes(15),
            refresh_expires_at: now + Duration::hours(168),
        };

        let response = TokenResponse::from_pair(pair, Duration::minutes(15));
        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["access_token"], "a".repeat(64));
    }

    #[test]
    fn test_user_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&UserId(42)).unwrap(), "42");
    }
}
