//! Authentication error types.

use thiserror::Error;

use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during registration and login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed validation. Every problem is listed.
    #[error("validation failed: {}", .0.join(" "))]
    Validation(Vec<String>),

    /// The normalized username is already registered.
    #[error("username already registered")]
    DuplicateUsername,

    /// Unknown user or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A user exists without a profile document.
    #[error("profile missing for existing user")]
    ProfileMissing,

    /// Token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
