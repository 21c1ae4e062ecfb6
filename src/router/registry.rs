//! Route registry: (path, method) -> handler

use crate::router::handler::SharedHandler;
use crate::utils::responses::ResponseBuilder;
use actix_web::{http::Method, http::StatusCode, HttpResponse, ResponseError};
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

/// Registration and lookup failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The exact (path, method) pair is already taken
    #[error("this path {path} with {method} method already exists")]
    DuplicateRoute { method: Method, path: String },

    /// No route is registered under this path for any method
    #[error("path {0} not found")]
    RouteNotFound(String),

    /// The path exists but not for this method
    #[error("method {method} does not exist on path {path}")]
    MethodNotAllowed { method: Method, path: String },
}

impl ResponseError for RouteError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::DuplicateRoute { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            // Both lookup misses surface as a plain not-found
            Self::RouteNotFound(_) | Self::MethodNotAllowed { .. } => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::DuplicateRoute { .. } => ResponseBuilder::internal_server_error().build(),
            Self::RouteNotFound(_) | Self::MethodNotAllowed { .. } => {
                ResponseBuilder::not_found().build()
            }
        }
    }
}

/// Two-level route table keyed by path, then method
#[derive(Default)]
pub struct RouteRegistry {
    routes: RwLock<HashMap<String, HashMap<Method, SharedHandler>>>,
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.routes())
            .finish()
    }
}

impl RouteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an exact (method, path) pair
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRoute` if the pair is already registered; the existing
    /// handler is kept
    pub fn register(
        &self,
        method: Method,
        path: &str,
        handler: SharedHandler,
    ) -> Result<(), RouteError> {
        let mut routes = self.routes.write();
        let methods = routes.entry(path.to_string()).or_default();

        if methods.contains_key(&method) {
            return Err(RouteError::DuplicateRoute {
                method,
                path: path.to_string(),
            });
        }

        methods.insert(method, handler);
        Ok(())
    }

    /// Find the handler for a request
    ///
    /// # Errors
    ///
    /// Returns `RouteNotFound` for an unknown path and `MethodNotAllowed` for a
    /// known path without this method
    pub fn resolve(&self, method: &Method, path: &str) -> Result<SharedHandler, RouteError> {
        let routes = self.routes.read();
        let methods = routes
            .get(path)
            .ok_or_else(|| RouteError::RouteNotFound(path.to_string()))?;

        methods
            .get(method)
            .cloned()
            .ok_or_else(|| RouteError::MethodNotAllowed {
                method: method.clone(),
                path: path.to_string(),
            })
    }

    /// Registered (method, path) pairs, sorted by path then method
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        let routes = self.routes.read();
        let mut listing: Vec<(Method, String)> = routes
            .iter()
            .flat_map(|(path, methods)| {
                methods
                    .keys()
                    .map(move |method| (method.clone(), path.clone()))
            })
            .collect();
        listing.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        listing
    }
}
