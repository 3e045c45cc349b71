//! Integration tests for Digital Garden.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p garden-integration-tests
//! ```
//!
//! The full router (middleware included) is driven in process with
//! `tower::ServiceExt::oneshot`. Accounts live in a [`MemoryStore`], so no
//! database is needed.
//!
//! # Test Categories
//!
//! - `auth_flow` - Registration and login over HTTP
//! - `token_gate` - Bearer token enforcement
//! - `records` - Profile, store and purchase endpoints
//! - `middleware` - Body limit, request IDs, dev simulation
//! - `postgres_store` - `PgStore` against a live database (`#[ignore]`d; run
//!   with `--ignored` and `GARDEN_TEST_DATABASE_URL`)

use std::collections::HashMap;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use garden_server::config::ServerConfig;
use garden_server::db::MemoryStore;
use garden_server::state::AppState;

/// Signing secret used by every test app.
pub const TEST_JWT_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, `Value::String` for non-JSON bodies, `Value::Null` if empty.
    pub body: Value,
}

/// An in-process server backed by a memory store.
#[derive(Clone)]
pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// App with production settings and a cheap password hash.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is rejected.
    #[must_use]
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// App with extra environment variables layered over the defaults.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is rejected.
    #[must_use]
    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = [
            ("GARDEN_DATABASE_URL", "postgres://unused/garden_test"),
            ("GARDEN_JWT_SECRET", TEST_JWT_SECRET),
            ("GARDEN_ARGON2_MEMORY_KIB", "1024"),
            ("GARDEN_ARGON2_ITERATIONS", "1"),
            ("GARDEN_ARGON2_PARALLELISM", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        for (k, v) in overrides {
            vars.insert((*k).to_owned(), (*v).to_owned());
        }

        let config = ServerConfig::from_vars(&|key| vars.get(key).cloned())
            .unwrap_or_else(|e| panic!("test config rejected: {e}"));

        let store = MemoryStore::new();
        let state = AppState::new(
            config,
            std::sync::Arc::new(store.clone()),
            std::sync::Arc::new(store.clone()),
        )
        .unwrap_or_else(|e| panic!("test state rejected: {e}"));
        let router = garden_server::app(state.clone());

        Self {
            store,
            state,
            router,
        }
    }

    /// Send a raw request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("failed to read body: {e}"));

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a JSON request, optionally with a bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(
            builder
                .body(body)
                .unwrap_or_else(|e| panic!("bad request: {e}")),
        )
        .await
    }

    /// POST /api/register
    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({ "username": username, "password": password });
        self.request(Method::POST, "/api/register", None, Some(&body))
            .await
    }

    /// POST /api/login
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({ "username": username, "password": password });
        self.request(Method::POST, "/api/login", None, Some(&body))
            .await
    }

    /// Register an account and return its token.
    ///
    /// # Panics
    ///
    /// Panics if registration does not succeed.
    pub async fn register_token(&self, username: &str, password: &str) -> String {
        let response = self.register(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["token"]
            .as_str()
            .unwrap_or_else(|| panic!("no token in {:?}", response.body))
            .to_owned()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
