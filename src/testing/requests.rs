//! HTTP request builders for testing handlers and the dispatcher

use actix_web::http::Method;
use actix_web::test::TestRequest;
use actix_web::HttpRequest;
use serde_json::{json, Value};

use crate::session::BEARER_PREFIX;

/// Builder for creating HTTP requests for testing
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            uri: "/".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set `Authorization: Bearer <token>`
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("{BEARER_PREFIX}{token}"))
    }

    #[must_use]
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Build the underlying `TestRequest`, for `call_service` style tests
    #[must_use]
    pub fn to_test_request(self) -> TestRequest {
        let mut req = TestRequest::default().method(self.method).uri(&self.uri);

        for (name, value) in self.headers {
            req = req.insert_header((name, value));
        }

        if let Some(body) = self.body {
            req = req.set_json(body);
        }

        req
    }

    /// Build the final `HttpRequest`
    #[must_use]
    pub fn build(self) -> HttpRequest {
        self.to_test_request().to_http_request()
    }
}

/// Quick builders for the gateway endpoints
impl RequestBuilder {
    /// `POST /api/login`
    #[must_use]
    pub fn login(user: &str, pass: &str) -> TestRequest {
        Self::new()
            .method(Method::POST)
            .uri("/api/login")
            .json_body(json!({ "user": user, "pass": pass }))
            .to_test_request()
    }

    /// `POST /api/refresh`
    #[must_use]
    pub fn refresh(refresh_token: &str) -> TestRequest {
        Self::new()
            .method(Method::POST)
            .uri("/api/refresh")
            .json_body(json!({ "refresh_token": refresh_token }))
            .to_test_request()
    }

    /// Authenticated request to any path
    #[must_use]
    pub fn authorized(method: Method, uri: &str, access_token: &str) -> TestRequest {
        Self::new()
            .method(method)
            .uri(uri)
            .bearer(access_token)
            .to_test_request()
    }
}
