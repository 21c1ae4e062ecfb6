//! Routing Module
//!
//! - [`registry`] - (path, method) -> handler table
//! - [`dispatcher`] - authorization gate in front of the registry
//! - [`context`] - typed per-request context and process-wide init state
//! - [`handler`] - the handler trait and closure adapter

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod registry;

pub use context::{Caller, InitState, InitValues, PayrollPeriod, RequestContext};
pub use dispatcher::{dispatch_request, AuthRejection, Dispatcher, PublicPaths, REQUEST_ID_HEADER};
pub use handler::{handler_fn, FnHandler, RouteHandler, SharedHandler};
pub use registry::{RouteError, RouteRegistry};
