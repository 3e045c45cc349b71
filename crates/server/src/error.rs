//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is JSON, either `{"error": ...}`
//! or `{"errors": [...]}` for validation failures.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::{AuthError, RecordError};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Registration or login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Registration failed after validation (storage or crypto fault).
    #[error("Registration failed: {0}")]
    Registration(AuthError),

    /// Record access failed.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Request body could not be read as the expected JSON.
    #[error("Invalid body: {0}")]
    Body(#[from] JsonRejection),
}

impl AppError {
    /// Wrap an error from registration.
    ///
    /// Client errors keep their own mapping; everything else becomes the
    /// generic registration failure.
    #[must_use]
    pub fn registration(err: AuthError) -> Self {
        match err {
            AuthError::Validation(_) | AuthError::DuplicateUsername => Self::Auth(err),
            other => Self::Registration(other),
        }
    }

    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Registration(_)
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Token(_)
                )
                | Self::Record(RecordError::Repository(_))
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::Validation(_) | AuthError::DuplicateUsername => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials | AuthError::ProfileMissing => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::Token(_) | AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Record(err) => match err {
                RecordError::UserMissing
                | RecordError::ProfileMissing
                | RecordError::StoreMissing
                | RecordError::PurchasesMissing => StatusCode::UNAUTHORIZED,
                RecordError::NotUpdated(_) => StatusCode::NOT_FOUND,
                RecordError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Body(rejection) => rejection.status(),
            Self::Registration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Don't expose internal error details to clients
    fn message(&self) -> String {
        match self {
            Self::Auth(err) => match err {
                AuthError::DuplicateUsername => {
                    "Account with username already registered".to_string()
                }
                AuthError::InvalidCredentials => "Invalid Credentials".to_string(),
                AuthError::ProfileMissing => "Profile does not exist".to_string(),
                _ => "Internal server error".to_string(),
            },
            Self::Registration(_) => "Registration failed".to_string(),
            Self::Record(err) => match err {
                RecordError::UserMissing => "User does not exist".to_string(),
                RecordError::ProfileMissing => "Profile does not exist".to_string(),
                RecordError::StoreMissing => "Store does not exist".to_string(),
                RecordError::PurchasesMissing => "Purchases do not exist".to_string(),
                RecordError::NotUpdated(what) => format!("Could not update {what}"),
                RecordError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Body(rejection) => rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        if let Self::Auth(AuthError::Validation(errors)) = self {
            return (status, Json(json!({ "errors": errors }))).into_response();
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the current request.
///
/// Call this after a token is verified to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::db::RepositoryError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Record(RecordError::StoreMissing);
        assert_eq!(err.to_string(), "Record error: store does not exist");
    }

    #[tokio::test]
    async fn test_validation_uses_errors_key() {
        let (status, body) = body_json(AppError::Auth(AuthError::Validation(vec![
            "Username needs to be at least 3 characters.".to_owned(),
        ])))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "errors": ["Username needs to be at least 3 characters."] })
        );
    }

    #[tokio::test]
    async fn test_auth_status_codes() {
        let (status, body) = body_json(AppError::Auth(AuthError::DuplicateUsername)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Account with username already registered");

        let (status, body) = body_json(AppError::Auth(AuthError::InvalidCredentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid Credentials");
    }

    #[tokio::test]
    async fn test_registration_failure_hides_detail() {
        let err = AppError::registration(AuthError::Repository(RepositoryError::DataCorruption(
            "secret internals".to_owned(),
        )));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Registration failed" }));
    }

    #[test]
    fn test_registration_keeps_client_errors() {
        let err = AppError::registration(AuthError::DuplicateUsername);
        assert!(matches!(err, AppError::Auth(AuthError::DuplicateUsername)));
    }

    #[tokio::test]
    async fn test_record_status_codes() {
        let (status, body) = body_json(AppError::Record(RecordError::UserMissing)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "User does not exist");

        let (status, body) = body_json(AppError::Record(RecordError::NotUpdated("store"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Could not update store");

        let err = AppError::Record(RecordError::Repository(RepositoryError::DataCorruption(
            "bad document".to_owned(),
        )));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
