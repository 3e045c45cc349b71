//! Purchase ledger routes (bearer token required).

use axum::{Json, extract::State};
use serde::Deserialize;

use super::{IndexedItems, JsonBody, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Item;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdatePurchasesRequest {
    pub updated_purchases: Vec<Item>,
}

/// GET /api/purchases
///
/// # Errors
///
/// Returns 401 if the user or ledger does not exist.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<IndexedItems>> {
    let items = state.records().purchases(&user).await?;
    Ok(Json(IndexedItems(items)))
}

/// PUT /api/purchases/update
///
/// # Errors
///
/// Returns 401 if the ledger does not exist and 404 if the update matched
/// nothing.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(body): JsonBody<UpdatePurchasesRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .records()
        .replace_purchases(&user, &body.updated_purchases)
        .await?;

    Ok(Json(MessageResponse::new("purchases updated successfully")))
}
