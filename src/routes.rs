//! Route table
//!
//! Every endpoint the gateway serves is registered here; the resulting
//! [`Dispatcher`] is mounted as actix's default service.

use crate::auth::UserDirectory;
use crate::handlers::{whoami, HealthHandler, LoginHandler, LogoutHandler, RefreshHandler};
use crate::router::{handler_fn, Dispatcher, InitState, PublicPaths, RouteError, RouteRegistry};
use crate::session::TokenStore;
use crate::settings::PayslipSettings;
use actix_web::http::Method;
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/api/login";
pub const REFRESH_PATH: &str = "/api/refresh";
pub const LOGOUT_PATH: &str = "/api/logout";
pub const WHOAMI_PATH: &str = "/api/me";
pub const HEALTH_PATH: &str = "/ping";

/// Register the gateway endpoints
///
/// # Errors
///
/// Returns `DuplicateRoute` if a (method, path) pair is registered twice
pub fn register_routes(
    registry: &RouteRegistry,
    store: &Arc<TokenStore>,
    directory: &Arc<UserDirectory>,
) -> Result<(), RouteError> {
    registry.register(
        Method::POST,
        LOGIN_PATH,
        Arc::new(LoginHandler::new(store.clone(), directory.clone())),
    )?;
    registry.register(
        Method::POST,
        REFRESH_PATH,
        Arc::new(RefreshHandler::new(store.clone())),
    )?;
    registry.register(
        Method::POST,
        LOGOUT_PATH,
        Arc::new(LogoutHandler::new(store.clone())),
    )?;
    registry.register(Method::GET, WHOAMI_PATH, handler_fn(whoami))?;
    registry.register(
        Method::GET,
        HEALTH_PATH,
        Arc::new(HealthHandler::new(store.clone())),
    )?;
    Ok(())
}

/// Build the dispatcher for the configured public paths
///
/// # Errors
///
/// Returns `DuplicateRoute` if route registration collides
pub fn build_dispatcher(
    settings: &PayslipSettings,
    store: Arc<TokenStore>,
    directory: Arc<UserDirectory>,
    init: Arc<InitState>,
) -> Result<Dispatcher, RouteError> {
    let registry = RouteRegistry::new();
    register_routes(&registry, &store, &directory)?;

    Ok(Dispatcher::new(
        registry,
        store,
        directory,
        PublicPaths::new(&settings.routing.public_paths),
        init,
    ))
}
