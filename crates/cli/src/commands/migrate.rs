//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! garden-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `GARDEN_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/server/migrations/` and are embedded at build time.

use garden_server::db::postgres::MIGRATOR;
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("GARDEN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("GARDEN_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
