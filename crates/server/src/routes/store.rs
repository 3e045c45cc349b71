//! Store routes (bearer token required).

use axum::{Json, extract::State};
use serde::Deserialize;

use super::{IndexedItems, JsonBody, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Item;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    pub updated_store: Vec<Item>,
}

/// GET /api/store
///
/// # Errors
///
/// Returns 401 if the store document does not exist.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<IndexedItems>> {
    let items = state.records().store(&user).await?;
    Ok(Json(IndexedItems(items)))
}

/// PUT /api/store/update
///
/// # Errors
///
/// Returns 401 if the store document does not exist and 404 if the update
/// matched nothing.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(body): JsonBody<UpdateStoreRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .records()
        .replace_store(&user, &body.updated_store)
        .await?;

    Ok(Json(MessageResponse::new("store updated successfully")))
}
