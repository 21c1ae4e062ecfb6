//! Bearer credential extraction from the `Authorization` header

use crate::session::errors::TokenError;
use actix_web::{http::header, HttpRequest};

/// Scheme prefix expected in front of the access token
pub const BEARER_PREFIX: &str = "Bearer ";

/// Parse a raw `Authorization` header value into the access token it carries
///
/// # Errors
///
/// Returns `MalformedCredential` if the value is empty, lacks the `Bearer ` prefix,
/// or carries no token after the prefix
pub fn extract_bearer(header_value: &str) -> Result<&str, TokenError> {
    if header_value.is_empty() {
        return Err(TokenError::MalformedCredential("empty authorization header"));
    }

    let token = header_value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(TokenError::MalformedCredential(
            "authorization header lacks bearer scheme",
        ))?;

    if token.is_empty() {
        return Err(TokenError::MalformedCredential("bearer token is empty"));
    }

    Ok(token)
}

/// Read and parse the `Authorization` header of a request
///
/// # Errors
///
/// Returns `MalformedCredential` if the header is missing, not valid ASCII, or
/// fails [`extract_bearer`]
pub fn bearer_from_request(req: &HttpRequest) -> Result<String, TokenError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(TokenError::MalformedCredential("missing authorization header"))?
        .to_str()
        .map_err(|_| TokenError::MalformedCredential("authorization header is not ascii"))?;

    extract_bearer(value).map(ToString::to_string)
}
