//! Bearer token authentication.
//!
//! [`RequireAuth`] guards every profile, store and purchase route. A request
//! either carries a valid token and proceeds with the caller's identity, or is
//! rejected with 401 before the handler runs.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::Span;

use crate::error::set_sentry_user;
use crate::models::AuthenticatedUser;
use crate::services::auth::TokenError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub AuthenticatedUser);

/// Error returned when a request has no usable token.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// The token failed verification.
    InvalidToken(TokenError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "Access token required",
            Self::InvalidToken(TokenError::Expired) => "Token expired",
            Self::InvalidToken(_) => "Invalid token",
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// The scheme is matched case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AuthRejection::MissingToken)?;

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "Rejected bearer token");
            AuthRejection::InvalidToken(e)
        })?;

        let user = AuthenticatedUser::from(claims);

        Span::current().record("user_id", tracing::field::display(user.user_id));
        set_sentry_user(&user.user_id, user.username.as_str());

        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }

    #[test]
    fn test_rejection_is_unauthorized() {
        let response = AuthRejection::InvalidToken(TokenError::BadSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthRejection::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
