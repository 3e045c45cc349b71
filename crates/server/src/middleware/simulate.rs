//! Failure simulation for local development.
//!
//! Lets a frontend exercise its loading and error states against a local
//! server. Only mounted when `GARDEN_ENV=development`.

use std::time::Duration;

use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Delay the request by this many milliseconds.
pub const SIMULATE_COLD_HEADER: &str = "x-simulate-cold";

/// Respond 503 without running the handler.
pub const SIMULATE_503_HEADER: &str = "x-simulate-503";

/// Upper bound on a simulated cold start.
const MAX_SIMULATED_DELAY_MS: u64 = 60_000;

/// Middleware that honours the simulation headers.
///
/// A positive `x-simulate-cold` delay takes precedence over `x-simulate-503`.
pub async fn dev_simulation_middleware(request: Request, next: Next) -> Response {
    let delay_ms = request
        .headers()
        .get(SIMULATE_COLD_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0);

    if let Some(ms) = delay_ms {
        let ms = ms.min(MAX_SIMULATED_DELAY_MS);
        tracing::info!(delay_ms = ms, "Simulating cold start delay");
        tokio::time::sleep(Duration::from_millis(ms)).await;
        return next.run(request).await;
    }

    if request.headers().contains_key(SIMULATE_503_HEADER) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Service Unavailable (simulated)" })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(dev_simulation_middleware))
    }

    fn request(header: Option<(&str, &str)>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_passthrough() {
        let response = app().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_simulated_503() {
        let response = app()
            .oneshot(request(Some((SIMULATE_503_HEADER, "1"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_simulated_delay_still_serves() {
        let started = tokio::time::Instant::now();
        let response = app()
            .oneshot(request(Some((SIMULATE_COLD_HEADER, "20"))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_invalid_delay_ignored() {
        let response = app()
            .oneshot(request(Some((SIMULATE_COLD_HEADER, "soon"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
