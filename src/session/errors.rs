//! Session store error taxonomy
//!
//! Every variant except `TokenGenerationFailure` collapses to the same 401 body at
//! the HTTP boundary so callers cannot probe session state.

use crate::utils::responses::ResponseBuilder;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Errors raised by the token store and bearer credential parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The OS random source could not produce token bytes
    #[error("failed to generate {kind} token bytes: {reason}")]
    TokenGenerationFailure { kind: &'static str, reason: String },

    /// No live record holds this token value
    #[error("token not found")]
    TokenNotFound,

    /// The access grant itself is past its expiry
    #[error("token expired")]
    TokenExpired,

    /// The owning session is past its refresh expiry
    #[error("session expired")]
    SessionExpired,

    /// The owner no longer has the session this grant was issued with
    #[error("no active session")]
    NoActiveSession,

    /// The transport credential header is absent or has the wrong scheme
    #[error("malformed credential: {0}")]
    MalformedCredential(&'static str),
}

impl TokenError {
    /// Whether this error belongs to the uniform unauthorized class
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        !matches!(self, Self::TokenGenerationFailure { .. })
    }
}

impl ResponseError for TokenError {
    fn status_code(&self) -> StatusCode {
        if self.is_unauthorized() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::TokenGenerationFailure { .. } => ResponseBuilder::internal_server_error().build(),
            Self::MalformedCredential(_) => ResponseBuilder::bad_authorization_header(),
            _ => ResponseBuilder::token_unauthorized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_map_to_unauthorized() {
        for err in [
            TokenError::TokenNotFound,
            TokenError::TokenExpired,
            TokenError::SessionExpired,
            TokenError::NoActiveSession,
            TokenError::MalformedCredential("empty header"),
        ] {
            assert!(err.is_unauthorized());
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_generation_failure_is_server_error() {
        let err = TokenError::TokenGenerationFailure {
            kind: "access",
            reason: "entropy source unavailable".to_string(),
        };
        assert!(!err.is_unauthorized());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(err.to_string().contains("access"));
    }
}
