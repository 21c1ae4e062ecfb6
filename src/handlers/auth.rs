// Authentication handlers: login, refresh and logout
use crate::auth::CredentialVerifier;
use crate::models::{LoginRequest, RefreshRequest, TokenResponse};
use crate::router::{RequestContext, RouteHandler};
use crate::session::{bearer_from_request, TokenError, TokenStore};
use crate::utils::responses::ResponseBuilder;
use actix_web::{web::Bytes, HttpRequest, HttpResponse, ResponseError};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Decode a JSON request body, answering 400 on failure
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, HttpResponse> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejecting malformed request body: {e}");
        ResponseBuilder::invalid_body(&e.to_string())
    })
}

/// `POST /api/login`: check credentials, then issue a fresh pair
pub struct LoginHandler {
    store: Arc<TokenStore>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl LoginHandler {
    #[must_use]
    pub fn new(store: Arc<TokenStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { store, verifier }
    }
}

#[async_trait(?Send)]
impl RouteHandler for LoginHandler {
    async fn handle(&self, _req: HttpRequest, _ctx: RequestContext, body: Bytes) -> HttpResponse {
        let login: LoginRequest = match parse_body(&body) {
            Ok(login) => login,
            Err(response) => return response,
        };

        if login.role.is_some() {
            debug!("Ignoring role field in login request for {}", login.user);
        }

        match self.verifier.verify(&login.user, &login.pass).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Login failed for {}", login.user);
                return ResponseBuilder::authentication_failed("invalid username or password");
            }
            Err(e) => {
                warn!("Credential verification error for {}: {e}", login.user);
                return ResponseBuilder::authentication_failed("invalid username or password");
            }
        }

        match self.store.issue_pair(&login.user) {
            Ok(pair) => ResponseBuilder::ok().json(&TokenResponse::from_pair(
                pair,
                self.store.config().access_ttl(),
            )),
            Err(e) => {
                error!("Failed to issue tokens for {}: {e}", login.user);
                e.error_response()
            }
        }
    }
}

/// `POST /api/refresh`: single-use rotation of a refresh token
pub struct RefreshHandler {
    store: Arc<TokenStore>,
}

impl RefreshHandler {
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }
}

#[async_trait(?Send)]
impl RouteHandler for RefreshHandler {
    async fn handle(&self, _req: HttpRequest, _ctx: RequestContext, body: Bytes) -> HttpResponse {
        let refresh: RefreshRequest = match parse_body(&body) {
            Ok(refresh) => refresh,
            Err(response) => return response,
        };

        match self.store.rotate(&refresh.refresh_token) {
            Ok(pair) => ResponseBuilder::ok().json(&TokenResponse::from_pair(
                pair,
                self.store.config().access_ttl(),
            )),
            Err(e @ TokenError::TokenGenerationFailure { .. }) => {
                error!("Refresh failed: {e}");
                e.error_response()
            }
            Err(e) => {
                debug!("Refresh rejected: {e}");
                ResponseBuilder::token_unauthorized()
            }
        }
    }
}

/// `POST /api/logout`: revoke the session behind the presented access token
///
/// The grant must still exist and belong to the authenticated caller.
pub struct LogoutHandler {
    store: Arc<TokenStore>,
}

impl LogoutHandler {
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }
}

#[async_trait(?Send)]
impl RouteHandler for LogoutHandler {
    async fn handle(&self, req: HttpRequest, ctx: RequestContext, _body: Bytes) -> HttpResponse {
        let caller = match ctx.caller() {
            Ok(caller) => caller,
            Err(e) => return e.error_response(),
        };

        let owner = bearer_from_request(&req)
            .ok()
            .and_then(|token| self.store.owner_of(&token));
        match owner {
            Some(owner) if owner == caller.owner => {
                self.store.revoke(&owner);
                ResponseBuilder::no_content()
            }
            _ => {
                debug!("Logout rejected: grant no longer held by {}", caller.owner);
                ResponseBuilder::token_unauthorized()
            }
        }
    }
}
