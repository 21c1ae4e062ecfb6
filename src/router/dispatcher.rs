//! Request Dispatcher - authorization gate in front of the route registry
//!
//! Per request:
//!
//! 1. Resolve the route (miss -> 404, no further work).
//! 2. Public path -> dispatch with an anonymous context.
//! 3. Protected path -> bearer header, token store `authorize`, identity
//!    resolution. Any failure is a terminal 401.
//! 4. Build the [`RequestContext`] (caller, fresh request id, init snapshot).
//! 5. Hand off to the handler.
//!
//! The dispatcher never retries and never holds a store or registry lock while a
//! handler runs.

use crate::auth::{DirectoryError, IdentityResolver};
use crate::router::context::{Caller, InitState, RequestContext};
use crate::router::registry::{RouteError, RouteRegistry};
use crate::session::{bearer_from_request, TokenError, TokenStore};
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::ResponseBuilder;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Response header echoing the correlation id of a dispatched request
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// =============================================================================
// Public paths
// =============================================================================

/// Paths exempt from authorization
///
/// Entries are exact paths, or prefixes when written with a trailing `*`
/// (`/public/*` matches `/public/` and everything below it).
#[derive(Debug, Clone, Default)]
pub struct PublicPaths {
    exact: HashSet<String>,
    prefixes: Vec<String>,
}

impl PublicPaths {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = Self::default();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            match entry.strip_suffix('*') {
                Some(prefix) => paths.prefixes.push(prefix.to_string()),
                None => {
                    paths.exact.insert(entry.to_string());
                }
            }
        }
        paths
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.exact.contains(path) || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

// =============================================================================
// Rejections
// =============================================================================

/// Why a protected request was turned away
///
/// The variants only matter for logging; callers always get a 401.
#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("bad authorization header: {0}")]
    BadHeader(TokenError),

    #[error("token unauthorized: {0}")]
    Token(TokenError),

    #[error("token unauthorized: {0}")]
    Identity(DirectoryError),
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::BadHeader(_) => ResponseBuilder::bad_authorization_header(),
            Self::Token(_) | Self::Identity(_) => ResponseBuilder::token_unauthorized(),
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Composes the route registry with the token store
pub struct Dispatcher {
    registry: RouteRegistry,
    store: Arc<TokenStore>,
    identity: Arc<dyn IdentityResolver>,
    public_paths: PublicPaths,
    init: Arc<InitState>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("public_paths", &self.public_paths)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        registry: RouteRegistry,
        store: Arc<TokenStore>,
        identity: Arc<dyn IdentityResolver>,
        public_paths: PublicPaths,
        init: Arc<InitState>,
    ) -> Self {
        Self {
            registry,
            store,
            identity,
            public_paths,
            init,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn public_paths(&self) -> &PublicPaths {
        &self.public_paths
    }

    /// Run the bearer -> authorize -> identity chain for a protected request
    ///
    /// # Errors
    ///
    /// Returns the first failing step as an [`AuthRejection`]
    pub async fn authorize_request(&self, req: &HttpRequest) -> Result<Caller, AuthRejection> {
        let access_token = bearer_from_request(req).map_err(AuthRejection::BadHeader)?;
        let owner = self
            .store
            .authorize(&access_token)
            .map_err(AuthRejection::Token)?;

        let user_id = self
            .identity
            .resolve_user_id(&owner)
            .await
            .map_err(|e| {
                LoggingHelper::log_identity_unresolved(&owner, &e);
                AuthRejection::Identity(e)
            })?;

        Ok(Caller { owner, user_id })
    }

    /// Route, gate and hand a request to its handler
    pub async fn dispatch(&self, req: HttpRequest, body: web::Bytes) -> HttpResponse {
        let method = req.method().clone();
        let path = req.path().to_string();

        let handler = match self.registry.resolve(&method, &path) {
            Ok(handler) => handler,
            Err(err) => {
                if matches!(err, RouteError::MethodNotAllowed { .. }) {
                    LoggingHelper::log_method_not_allowed(method.as_str(), &path);
                } else {
                    LoggingHelper::log_path_not_found(&path);
                }
                return err.error_response();
            }
        };

        let ctx = if self.public_paths.is_public(&path) {
            RequestContext::public(self.init.snapshot())
        } else {
            match self.authorize_request(&req).await {
                Ok(caller) => RequestContext::authenticated(caller, self.init.snapshot()),
                Err(rejection) => {
                    if let AuthRejection::BadHeader(reason) | AuthRejection::Token(reason) =
                        &rejection
                    {
                        LoggingHelper::log_auth_rejected(method.as_str(), &path, reason);
                    }
                    return rejection.error_response();
                }
            }
        };

        let request_id = ctx.request_id;
        LoggingHelper::log_dispatch(
            method.as_str(),
            &path,
            &request_id,
            ctx.caller.as_ref().map(|c| c.user_id.0),
        );

        let mut response = handler.handle(req, ctx, body).await;
        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        response
    }
}

/// actix entry point: every request not matched elsewhere lands here
pub async fn dispatch_request(
    req: HttpRequest,
    body: web::Bytes,
    dispatcher: web::Data<Dispatcher>,
) -> HttpResponse {
    dispatcher.dispatch(req, body).await
}
