//! Router test harness: the full application wired to in-memory mock
//! stores, driven through `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use sel_core::server::build_app;
use sel_core::server::routes::test_helpers::{test_context, TestContext};

pub struct Harness {
    pub ctx: TestContext,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            ctx: test_context(false),
        }
    }

    /// Harness with the unauthenticated "admin" fallback enabled
    pub fn with_dev_fallback() -> Self {
        Self {
            ctx: test_context(true),
        }
    }

    pub fn app(&self) -> Router {
        build_app(self.ctx.state.clone())
    }

    pub fn admin_token(&self) -> String {
        self.ctx
            .state
            .jwt
            .create_token("mira", "admin")
            .expect("token creation")
    }

    pub fn token_for(&self, username: &str, role: &str) -> String {
        self.ctx
            .state
            .jwt
            .create_token(username, role)
            .expect("token creation")
    }
}

pub struct RequestBuilder {
    method: &'static str,
    uri: String,
    token: Option<String>,
    accept: Option<String>,
    body: Option<Value>,
    raw_body: Option<String>,
}

pub fn get(uri: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new("GET", uri)
}

pub fn post(uri: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new("POST", uri)
}

pub fn put(uri: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new("PUT", uri)
}

pub fn delete(uri: impl Into<String>) -> RequestBuilder {
    RequestBuilder::new("DELETE", uri)
}

impl RequestBuilder {
    fn new(method: &'static str, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            token: None,
            accept: None,
            body: None,
            raw_body: None,
        }
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send the bytes as-is with a JSON content type, for exercising
    /// malformed-body handling.
    pub fn raw_json(mut self, body: &str) -> Self {
        self.raw_body = Some(body.to_string());
        self
    }

    pub async fn send(self, app: Router) -> (StatusCode, Value) {
        let (status, _, body) = self.send_full(app).await;
        (status, body)
    }

    /// Dispatch and return status, content type, and parsed JSON body
    /// (Null when the body is empty or not JSON).
    pub async fn send_full(self, app: Router) -> (StatusCode, String, Value) {
        let mut request = Request::builder().method(self.method).uri(&self.uri);
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(accept) = &self.accept {
            request = request.header(header::ACCEPT, accept);
        }
        let request = match (self.raw_body, self.body) {
            (Some(raw), _) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(raw))
                .unwrap(),
            (None, Some(body)) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            (None, None) => request.body(Body::empty()).unwrap(),
        };

        let response: Response<Body> = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, content_type, json)
    }

    /// Dispatch and return the raw body as text
    pub async fn send_text(self, app: Router) -> (StatusCode, String, String) {
        let mut request = Request::builder().method(self.method).uri(&self.uri);
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(accept) = &self.accept {
            request = request.header(header::ACCEPT, accept);
        }
        let request = request.body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
    }
}
