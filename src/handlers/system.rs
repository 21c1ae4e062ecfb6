// Health and caller-introspection endpoints
use crate::models::{HealthResponse, WhoAmIResponse};
use crate::router::{RequestContext, RouteHandler};
use crate::session::TokenStore;
use crate::utils::responses::ResponseBuilder;
use actix_web::{web::Bytes, HttpRequest, HttpResponse, ResponseError};
use async_trait::async_trait;
use std::sync::Arc;

/// `GET /ping`
pub struct HealthHandler {
    store: Arc<TokenStore>,
}

impl HealthHandler {
    #[must_use]
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }
}

#[async_trait(?Send)]
impl RouteHandler for HealthHandler {
    async fn handle(&self, _req: HttpRequest, _ctx: RequestContext, _body: Bytes) -> HttpResponse {
        let stats = self.store.stats();
        ResponseBuilder::ok().json(&HealthResponse {
            status: "ok".to_string(),
            message: "Payslip gateway is running".to_string(),
            sessions: stats.sessions,
            grants: stats.grants,
        })
    }
}

/// `GET /api/me`: echo the resolved caller and request context
pub async fn whoami(_req: HttpRequest, ctx: RequestContext, _body: Bytes) -> HttpResponse {
    let caller = match ctx.caller() {
        Ok(caller) => caller.clone(),
        Err(e) => return e.error_response(),
    };

    ResponseBuilder::ok().json(&WhoAmIResponse {
        user_id: caller.user_id,
        owner: caller.owner,
        request_id: ctx.request_id,
        payroll_period: ctx.init.payroll_period,
    })
}
