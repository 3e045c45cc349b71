//! `PostgreSQL` implementation of the account stores.
//!
//! Queries are checked at runtime (`sqlx::query`) so the crate builds without
//! a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use garden_core::{UserId, Username};

use super::{CredentialStore, ProvisioningTransaction, RepositoryError, UserDataStore};
use crate::models::{Item, NewUser, Profile, ProfilePatch, UserRecord};

/// Schema migrations for the server database.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Account store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Map a unique-constraint violation to `Conflict`.
fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

fn decode_items(value: serde_json::Value) -> Result<Vec<Item>, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid item list: {e}")))
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, password_hash, created_at
            FROM auth.users
            WHERE lower(username) = lower($1)
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, password_hash, created_at
            FROM auth.users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn begin(&self) -> Result<Box<dyn ProvisioningTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgProvisioningTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Provisioning transaction over a pooled connection.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
struct PgProvisioningTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProvisioningTransaction for PgProvisioningTransaction {
    async fn insert_user(&mut self, user: &NewUser) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO auth.users (id, username, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_unique_violation(e, "username"))?;

        Ok(())
    }

    async fn insert_profile(
        &mut self,
        id: UserId,
        profile: &Profile,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO user_data.profiles (id, document) VALUES ($1, $2)")
            .bind(id)
            .bind(Json(profile))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, "profile"))?;

        Ok(())
    }

    async fn insert_store(&mut self, id: UserId, items: &[Item]) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO user_data.stores (id, items) VALUES ($1, $2)")
            .bind(id)
            .bind(Json(items))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, "store"))?;

        Ok(())
    }

    async fn insert_purchases(
        &mut self,
        id: UserId,
        items: &[Item],
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO user_data.purchases (id, items) VALUES ($1, $2)")
            .bind(id)
            .bind(Json(items))
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, "purchase ledger"))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl UserDataStore for PgStore {
    async fn profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let document: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT document FROM user_data.profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        document
            .map(|doc| {
                serde_json::from_value(doc).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid profile document: {e}"))
                })
            })
            .transpose()
    }

    async fn update_profile(
        &self,
        id: UserId,
        patch: &ProfilePatch,
    ) -> Result<bool, RepositoryError> {
        // Top-level merge: only the keys present in the patch are replaced
        let result = sqlx::query(
            r"
            UPDATE user_data.profiles
            SET document = document || $2
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(Json(patch.to_document()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_balance(&self, id: UserId, balance: f64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE user_data.profiles
            SET document = jsonb_set(document, '{balance}', to_jsonb($2::float8))
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(balance)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn store_items(&self, id: UserId) -> Result<Option<Vec<Item>>, RepositoryError> {
        let items: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT items FROM user_data.stores WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        items.map(decode_items).transpose()
    }

    async fn replace_store_items(
        &self,
        id: UserId,
        items: &[Item],
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE user_data.stores SET items = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(items))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purchases(&self, id: UserId) -> Result<Option<Vec<Item>>, RepositoryError> {
        let items: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT items FROM user_data.purchases WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        items.map(decode_items).transpose()
    }

    async fn replace_purchases(
        &self,
        id: UserId,
        items: &[Item],
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE user_data.purchases SET items = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(items))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
