//! Business logic services.
//!
//! Services borrow their stores from [`crate::state::AppState`] per request and
//! return typed errors that [`crate::error::AppError`] maps onto HTTP.

pub mod auth;
pub mod records;

pub use auth::{AuthError, AuthService, AuthSession};
pub use records::{RecordError, RecordService};
