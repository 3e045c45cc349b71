//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! garden-cli account create -u alice -p 'correct horse'
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `GARDEN_DATABASE_URL` and `GARDEN_JWT_SECRET` are
//! required, and the `GARDEN_ARGON2_*` work factor applies to the new hash.

use std::sync::Arc;

use garden_server::config::{ConfigError, ServerConfig};
use garden_server::db::{self, PgStore};
use garden_server::services::AuthError;
use garden_server::state::AppState;
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Account could not be created.
    #[error("Could not create account: {0}")]
    Auth(#[from] AuthError),
}

/// Create an account through the same provisioning path as registration.
///
/// # Errors
///
/// Returns `AccountError::Auth` if validation fails, the username is taken,
/// or provisioning fails.
pub async fn create(username: &str, password: &str) -> Result<(), AccountError> {
    let config = ServerConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));
    let state = AppState::new(config, store.clone(), store)?;

    let session = state
        .auth()
        .register(Some(username), Some(password))
        .await?;

    tracing::info!(
        "Account created successfully! ID: {}, Username: {}",
        session.user_id,
        session.profile.username
    );

    Ok(())
}
