//! Route handler abstraction

use crate::router::context::RequestContext;
use actix_web::{web::Bytes, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A handler the dispatcher can hand an authorized request to
///
/// `HttpRequest` is not `Send`, so handler futures are not required to be either;
/// the handler objects themselves are shared across workers.
#[async_trait(?Send)]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, req: HttpRequest, ctx: RequestContext, body: Bytes) -> HttpResponse;
}

/// Shared handler object stored in the registry
pub type SharedHandler = Arc<dyn RouteHandler>;

/// Adapter turning an async closure into a [`RouteHandler`]
pub struct FnHandler<F>(F);

#[async_trait(?Send)]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(HttpRequest, RequestContext, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = HttpResponse> + 'static,
{
    async fn handle(&self, req: HttpRequest, ctx: RequestContext, body: Bytes) -> HttpResponse {
        (self.0)(req, ctx, body).await
    }
}

/// Wrap an async function or closure as a shared handler
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(HttpRequest, RequestContext, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + 'static,
{
    Arc::new(FnHandler(f))
}
