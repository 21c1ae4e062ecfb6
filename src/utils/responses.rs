//! HTTP response handling system
//!
//! This module provides a unified interface for creating JSON responses across the
//! gateway, offering consistent error bodies while keeping the bodies of the hot
//! rejection paths (401/404) pre-serialized.

use actix_web::{http::header, http::StatusCode, HttpResponse};
use serde_json::json;

// ===============================
// CACHED RESPONSES FOR PERFORMANCE
// ===============================

/// Global instance of pre-serialized common responses
static CACHED_RESPONSES: std::sync::LazyLock<CachedResponses> =
    std::sync::LazyLock::new(CachedResponses::new);

/// Container for pre-serialized common HTTP response bodies
struct CachedResponses {
    bad_authorization_header: String,
    token_unauthorized: String,
    unauthorized: String,
    not_found: String,
    server_error: String,
    invalid_request: String,
}

impl CachedResponses {
    fn new() -> Self {
        Self {
            bad_authorization_header: Self::create_json(
                "unauthorized",
                "bad authorization header",
            ),
            token_unauthorized: Self::create_json("unauthorized", "token unauthorized"),
            unauthorized: Self::create_json(
                "unauthorized",
                "Authentication is required to access this resource",
            ),
            not_found: Self::create_json("not_found", "The requested resource was not found"),
            server_error: Self::create_json("server_error", "An internal server error occurred"),
            invalid_request: Self::create_json(
                "invalid_request",
                "The request is malformed or invalid",
            ),
        }
    }

    fn create_json(error: &str, description: &str) -> String {
        json!({
            "error": error,
            "error_description": description
        })
        .to_string()
    }

    fn respond(status: StatusCode, body: &str) -> HttpResponse {
        HttpResponse::build(status)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(body.to_owned())
    }
}

/// Unified response builder for every JSON response the gateway emits
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    /// Create a `BadRequest` (400) error response with optional customization
    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::BadRequest)
    }

    /// Create an `Unauthorized` (401) error response with optional customization
    #[must_use]
    pub fn unauthorized() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::Unauthorized)
    }

    /// Create a `NotFound` (404) error response with optional customization
    #[must_use]
    pub fn not_found() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::NotFound)
    }

    /// Create an `InternalServerError` (500) error response with optional customization
    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(ErrorType::InternalServerError)
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// Create an OK response (200) with JSON content
    #[must_use]
    pub fn ok() -> JsonResponseBuilder {
        JsonResponseBuilder::new(StatusCode::OK)
    }

    /// Create a No Content (204) response
    #[must_use]
    pub fn no_content() -> HttpResponse {
        HttpResponse::NoContent().finish()
    }

    // ===============================
    // CACHED ERROR SHORTCUTS
    // ===============================

    /// 401 for a missing or malformed `Authorization` header
    #[must_use]
    pub fn bad_authorization_header() -> HttpResponse {
        CachedResponses::respond(
            StatusCode::UNAUTHORIZED,
            &CACHED_RESPONSES.bad_authorization_header,
        )
    }

    /// 401 for any token or session failure; the internal reason is never exposed
    #[must_use]
    pub fn token_unauthorized() -> HttpResponse {
        CachedResponses::respond(StatusCode::UNAUTHORIZED, &CACHED_RESPONSES.token_unauthorized)
    }

    // ===============================
    // CONVENIENCE METHODS
    // ===============================

    /// Common validation error: invalid request body
    #[must_use]
    pub fn invalid_body(reason: &str) -> HttpResponse {
        Self::bad_request()
            .with_error_code("invalid_body")
            .with_message(&format!("Invalid request body: {reason}"))
            .build()
    }

    /// Authentication failure
    #[must_use]
    pub fn authentication_failed(reason: &str) -> HttpResponse {
        Self::unauthorized()
            .with_error_code("authentication_failed")
            .with_message(reason)
            .build()
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    error_type: ErrorType,
    error_code: Option<String>,
    message: Option<String>,
}

/// Builder for JSON responses
pub struct JsonResponseBuilder {
    status_code: StatusCode,
}

#[derive(Clone, Copy)]
enum ErrorType {
    BadRequest,
    Unauthorized,
    NotFound,
    InternalServerError,
}

impl ErrorType {
    const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ===============================
// ERROR RESPONSE BUILDER IMPL
// ===============================

impl ErrorResponseBuilder {
    const fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            error_code: None,
            message: None,
        }
    }

    /// Set a custom error code (e.g., "`invalid_request`", "`authentication_failed`")
    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Set a custom error message
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        if self.error_code.is_none() && self.message.is_none() {
            return self.build_cached_response();
        }

        self.build_custom_response()
    }

    fn build_cached_response(&self) -> HttpResponse {
        let body = match self.error_type {
            ErrorType::BadRequest => &CACHED_RESPONSES.invalid_request,
            ErrorType::Unauthorized => &CACHED_RESPONSES.unauthorized,
            ErrorType::NotFound => &CACHED_RESPONSES.not_found,
            ErrorType::InternalServerError => &CACHED_RESPONSES.server_error,
        };
        CachedResponses::respond(self.error_type.status(), body)
    }

    fn build_custom_response(self) -> HttpResponse {
        let error_code = self
            .error_code
            .as_deref()
            .unwrap_or_else(|| self.default_error_code());
        let message = self
            .message
            .as_deref()
            .unwrap_or_else(|| self.default_message());

        HttpResponse::build(self.error_type.status())
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(json!({
                "error": error_code,
                "error_description": message,
            }))
    }

    const fn default_error_code(&self) -> &'static str {
        match self.error_type {
            ErrorType::BadRequest => "invalid_request",
            ErrorType::Unauthorized => "unauthorized",
            ErrorType::NotFound => "not_found",
            ErrorType::InternalServerError => "server_error",
        }
    }

    const fn default_message(&self) -> &'static str {
        match self.error_type {
            ErrorType::BadRequest => "The request is malformed or invalid",
            ErrorType::Unauthorized => "Authentication is required to access this resource",
            ErrorType::NotFound => "The requested resource was not found",
            ErrorType::InternalServerError => "An internal server error occurred",
        }
    }
}

// ===============================
// JSON RESPONSE BUILDER IMPL
// ===============================

impl JsonResponseBuilder {
    const fn new(status_code: StatusCode) -> Self {
        Self { status_code }
    }

    /// Build the response with JSON content
    #[must_use]
    pub fn json<T: serde::Serialize>(self, data: &T) -> HttpResponse {
        HttpResponse::build(self.status_code)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(data)
    }
}
