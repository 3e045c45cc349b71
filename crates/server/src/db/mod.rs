//! Persistence for accounts and per-user documents.
//!
//! # Database: `garden`
//!
//! `PostgreSQL` is used as a document store: each per-user document is a JSONB
//! column keyed by the owning user's ID.
//!
//! ## Schemas
//!
//! - `auth.users` - Credentials; case-insensitive unique username
//! - `user_data.profiles` - Profile documents
//! - `user_data.stores` - Store item collections
//! - `user_data.purchases` - Purchase ledgers
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p garden-cli -- migrate
//! ```
//!
//! # Seams
//!
//! Services never see a pool. They receive a [`CredentialStore`] and a
//! [`UserDataStore`]; [`PgStore`] backs both in production and
//! [`MemoryStore`] backs both in tests.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use garden_core::{UserId, Username};

use crate::models::{Item, NewUser, Profile, ProfilePatch, UserRecord};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Lookup and provisioning of user credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by normalized username.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, RepositoryError>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError>;

    /// Begin an atomic provisioning transaction.
    async fn begin(&self) -> Result<Box<dyn ProvisioningTransaction>, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The four inserts that create an account, applied all together or not at all.
///
/// Dropping a transaction without calling [`Self::commit`] discards every
/// staged insert.
#[async_trait]
pub trait ProvisioningTransaction: Send {
    /// Insert the user record.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the username is taken,
    /// even if the caller's earlier lookup saw it free.
    async fn insert_user(&mut self, user: &NewUser) -> Result<(), RepositoryError>;

    /// Insert the profile document.
    async fn insert_profile(
        &mut self,
        id: UserId,
        profile: &Profile,
    ) -> Result<(), RepositoryError>;

    /// Insert the store document.
    async fn insert_store(&mut self, id: UserId, items: &[Item]) -> Result<(), RepositoryError>;

    /// Insert the purchase ledger document.
    async fn insert_purchases(
        &mut self,
        id: UserId,
        items: &[Item],
    ) -> Result<(), RepositoryError>;

    /// Make every staged insert visible.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    /// Discard every staged insert.
    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Keyed access to a user's profile, store and purchase documents.
///
/// Update methods return whether a document matched the ID.
#[async_trait]
pub trait UserDataStore: Send + Sync {
    /// Get a user's profile.
    async fn profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError>;

    /// Apply a partial update to a profile.
    async fn update_profile(
        &self,
        id: UserId,
        patch: &ProfilePatch,
    ) -> Result<bool, RepositoryError>;

    /// Overwrite a profile's balance.
    async fn set_balance(&self, id: UserId, balance: f64) -> Result<bool, RepositoryError>;

    /// Get a user's store items.
    async fn store_items(&self, id: UserId) -> Result<Option<Vec<Item>>, RepositoryError>;

    /// Replace a user's store items.
    async fn replace_store_items(
        &self,
        id: UserId,
        items: &[Item],
    ) -> Result<bool, RepositoryError>;

    /// Get a user's purchase ledger.
    async fn purchases(&self, id: UserId) -> Result<Option<Vec<Item>>, RepositoryError>;

    /// Replace a user's purchase ledger.
    async fn replace_purchases(
        &self,
        id: UserId,
        items: &[Item],
    ) -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
