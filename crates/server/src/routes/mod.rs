//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store ping)
//!
//! # Auth
//! POST /api/register           - Create account, returns token + profile
//! POST /api/login              - Log in, returns token + profile
//!
//! # Records (bearer token required)
//! GET   /api/profile           - Caller's profile
//! PATCH /api/profile/balance   - Overwrite balance
//! PUT   /api/profile/update    - Partial profile update
//! GET   /api/store             - Store items
//! PUT   /api/store/update      - Replace store items
//! GET   /api/purchases         - Purchase ledger
//! PUT   /api/purchases/update  - Replace purchase ledger
//! ```

pub mod auth;
pub mod health;
pub mod profile;
pub mod purchases;
pub mod store;

use axum::{
    Json, Router,
    extract::FromRequest,
    routing::{get, patch, post, put},
};
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::error::AppError;
use crate::models::Item;
use crate::state::AppState;

/// JSON body extractor whose rejections render as `{"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// A plain `{"message": ...}` response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Items serialized as an object keyed by position: `{"0": a, "1": b}`.
///
/// Clients of the store and purchase endpoints read this shape.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedItems(pub Vec<Item>);

impl Serialize for IndexedItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (index, item) in self.0.iter().enumerate() {
            map.serialize_entry(&index.to_string(), item)?;
        }
        map.end()
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the record routes router.
pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::show))
        .route("/profile/balance", patch(profile::set_balance))
        .route("/profile/update", put(profile::update))
        .route("/store", get(store::show))
        .route("/store/update", put(store::update))
        .route("/purchases", get(purchases::show))
        .route("/purchases/update", put(purchases::update))
}

/// Create all `/api` routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(auth_routes()).merge(record_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_indexed_items_shape() {
        let items = IndexedItems(vec![json!({"id": "fern"}), json!("moss")]);
        assert_eq!(
            serde_json::to_value(&items).unwrap(),
            json!({"0": {"id": "fern"}, "1": "moss"})
        );
    }

    #[test]
    fn test_empty_items_are_empty_object() {
        assert_eq!(
            serde_json::to_value(IndexedItems(vec![])).unwrap(),
            json!({})
        );
    }
}
