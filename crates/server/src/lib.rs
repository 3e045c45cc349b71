//! Digital Garden server library.
//!
//! Account registration, token authentication and per-user records behind an
//! axum router. The binary in `main.rs` wires this to `PostgreSQL`; tests wire
//! the same router to [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware::from_fn,
    routing::get,
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary, outside this stack.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config().body_limit_bytes;

    let mut api = routes::routes();
    if state.config().is_development() {
        tracing::warn!("Development mode: request simulation headers enabled");
        api = api.layer(from_fn(middleware::dev_simulation_middleware));
    }

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/health/ready", get(routes::health::readiness))
        .nest("/api", api)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
