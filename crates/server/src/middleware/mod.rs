//! HTTP middleware stack for the server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Body limit
//! 5. Dev simulation (development only)
//!
//! Authentication is per route via the [`RequireAuth`] extractor.

pub mod auth;
pub mod request_id;
pub mod simulate;

pub use auth::{AuthRejection, RequireAuth};
pub use request_id::request_id_middleware;
pub use simulate::dev_simulation_middleware;
