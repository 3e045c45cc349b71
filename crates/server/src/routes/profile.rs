//! Profile routes (bearer token required).

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::{JsonBody, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Profile, ProfilePatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BalanceRequest {
    pub balance: f64,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub updated_profile: ProfilePatch,
}

/// GET /api/profile
///
/// # Errors
///
/// Returns 401 if the user or profile no longer exists.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    Ok(Json(state.records().profile(&user).await?))
}

/// PATCH /api/profile/balance
///
/// # Errors
///
/// Returns 401 if the user or profile no longer exists.
pub async fn set_balance(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(body): JsonBody<BalanceRequest>,
) -> Result<Json<BalanceResponse>> {
    state.records().set_balance(&user, body.balance).await?;

    Ok(Json(BalanceResponse {
        success: true,
        message: "User balance updated",
    }))
}

/// PUT /api/profile/update
///
/// # Errors
///
/// Returns 401 if the user or profile no longer exists and 404 if the update
/// matched nothing.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(body): JsonBody<UpdateProfileRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .records()
        .update_profile(&user, &body.updated_profile)
        .await?;

    Ok(Json(MessageResponse::new("Profile updated successfully")))
}
