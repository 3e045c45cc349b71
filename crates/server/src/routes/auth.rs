//! Registration and login routes.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::JsonBody;
use crate::error::{AppError, Result};
use crate::models::Profile;
use crate::services::AuthSession;
use crate::state::AppState;

/// Username and password, as sent to `/register` and `/login`.
///
/// Fields are optional so that a missing field is reported by validation
/// alongside every other problem.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response from a successful registration or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub profile: Profile,
}

impl AuthResponse {
    fn new(message: &'static str, session: AuthSession) -> Self {
        Self {
            message,
            token: session.token,
            profile: session.profile,
        }
    }
}

/// Register a new account.
///
/// POST /api/register
///
/// # Errors
///
/// Returns 400 with `errors` on validation failure, 400 if the username is
/// taken, and 500 if provisioning fails.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> Result<Json<AuthResponse>> {
    let session = state
        .auth()
        .register(body.username.as_deref(), body.password.as_deref())
        .await
        .map_err(AppError::registration)?;

    Ok(Json(AuthResponse::new(
        "User registered successfully",
        session,
    )))
}

/// Log in with username and password.
///
/// POST /api/login
///
/// # Errors
///
/// Returns 400 with `errors` on validation failure and 401 for bad
/// credentials or a missing profile.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CredentialsRequest>,
) -> Result<Json<AuthResponse>> {
    let session = state
        .auth()
        .login(body.username.as_deref(), body.password.as_deref())
        .await?;

    tracing::info!(user_id = %session.user_id, "User logged in");

    Ok(Json(AuthResponse::new("User logged in successfully", session)))
}
