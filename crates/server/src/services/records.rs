//! Per-user profile, store and purchase access.
//!
//! Every operation first checks that the caller's user record still exists,
//! then reads or replaces the matching document.

use thiserror::Error;

use garden_core::UserId;

use crate::db::{CredentialStore, RepositoryError, UserDataStore};
use crate::models::{AuthenticatedUser, Item, Profile, ProfilePatch};

/// Errors from record access.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The token's user no longer exists.
    #[error("user does not exist")]
    UserMissing,

    /// The user has no profile document.
    #[error("profile does not exist")]
    ProfileMissing,

    /// The user has no store document.
    #[error("store does not exist")]
    StoreMissing,

    /// The user has no purchase ledger.
    #[error("purchases do not exist")]
    PurchasesMissing,

    /// An update matched no document.
    #[error("could not update {0}")]
    NotUpdated(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Record accessors for an authenticated user.
pub struct RecordService<'a> {
    credentials: &'a dyn CredentialStore,
    records: &'a dyn UserDataStore,
}

impl<'a> RecordService<'a> {
    /// Create a new record service.
    #[must_use]
    pub const fn new(credentials: &'a dyn CredentialStore, records: &'a dyn UserDataStore) -> Self {
        Self {
            credentials,
            records,
        }
    }

    async fn require_user(&self, user: &AuthenticatedUser) -> Result<UserId, RecordError> {
        self.credentials
            .find_by_id(user.user_id)
            .await?
            .map(|record| record.id)
            .ok_or(RecordError::UserMissing)
    }

    async fn require_profile(&self, id: UserId) -> Result<Profile, RecordError> {
        self.records
            .profile(id)
            .await?
            .ok_or(RecordError::ProfileMissing)
    }

    /// Get the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::UserMissing` or `RecordError::ProfileMissing`.
    pub async fn profile(&self, user: &AuthenticatedUser) -> Result<Profile, RecordError> {
        let id = self.require_user(user).await?;
        self.require_profile(id).await
    }

    /// Overwrite the caller's balance.
    ///
    /// Succeeds when the profile matched, even if the value is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::UserMissing`, `RecordError::ProfileMissing` or
    /// `RecordError::NotUpdated`.
    pub async fn set_balance(
        &self,
        user: &AuthenticatedUser,
        balance: f64,
    ) -> Result<(), RecordError> {
        let id = self.require_user(user).await?;
        self.require_profile(id).await?;

        if self.records.set_balance(id, balance).await? {
            Ok(())
        } else {
            Err(RecordError::NotUpdated("profile"))
        }
    }

    /// Apply a partial update to the caller's profile.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::UserMissing`, `RecordError::ProfileMissing` or
    /// `RecordError::NotUpdated`.
    pub async fn update_profile(
        &self,
        user: &AuthenticatedUser,
        patch: &ProfilePatch,
    ) -> Result<(), RecordError> {
        let id = self.require_user(user).await?;
        self.require_profile(id).await?;

        if self.records.update_profile(id, patch).await? {
            Ok(())
        } else {
            Err(RecordError::NotUpdated("profile"))
        }
    }

    /// Get the caller's store items.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::StoreMissing` if the document is absent.
    pub async fn store(&self, user: &AuthenticatedUser) -> Result<Vec<Item>, RecordError> {
        self.records
            .store_items(user.user_id)
            .await?
            .ok_or(RecordError::StoreMissing)
    }

    /// Replace the caller's store items.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::StoreMissing` or `RecordError::NotUpdated`.
    pub async fn replace_store(
        &self,
        user: &AuthenticatedUser,
        items: &[Item],
    ) -> Result<(), RecordError> {
        if self.records.store_items(user.user_id).await?.is_none() {
            return Err(RecordError::StoreMissing);
        }

        if self.records.replace_store_items(user.user_id, items).await? {
            Ok(())
        } else {
            Err(RecordError::NotUpdated("store"))
        }
    }

    /// Get the caller's purchase ledger.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::UserMissing` or `RecordError::PurchasesMissing`.
    pub async fn purchases(&self, user: &AuthenticatedUser) -> Result<Vec<Item>, RecordError> {
        let id = self.require_user(user).await?;
        self.records
            .purchases(id)
            .await?
            .ok_or(RecordError::PurchasesMissing)
    }

    /// Replace the caller's purchase ledger.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::PurchasesMissing` or `RecordError::NotUpdated`.
    pub async fn replace_purchases(
        &self,
        user: &AuthenticatedUser,
        items: &[Item],
    ) -> Result<(), RecordError> {
        if self.records.purchases(user.user_id).await?.is_none() {
            return Err(RecordError::PurchasesMissing);
        }

        if self.records.replace_purchases(user.user_id, items).await? {
            Ok(())
        } else {
            Err(RecordError::NotUpdated("purchases"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use garden_core::Username;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewUser;

    async fn seeded() -> (MemoryStore, AuthenticatedUser) {
        let store = MemoryStore::new();
        let user = NewUser {
            id: UserId::generate(),
            username: Username::parse("gardener").unwrap(),
            password_hash: "$argon2id$stub".to_owned(),
            created_at: Utc::now(),
        };
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        tx.insert_profile(user.id, &Profile::new_for(user.username.clone(), user.created_at))
            .await
            .unwrap();
        tx.insert_store(user.id, &[]).await.unwrap();
        tx.insert_purchases(user.id, &[]).await.unwrap();
        tx.commit().await.unwrap();

        let auth = AuthenticatedUser {
            user_id: user.id,
            username: user.username,
        };
        (store, auth)
    }

    #[tokio::test]
    async fn test_profile_and_balance() {
        let (store, user) = seeded().await;
        let service = RecordService::new(&store, &store);

        service.set_balance(&user, 25.5).await.unwrap();
        // Same value again still counts as a match
        service.set_balance(&user, 25.5).await.unwrap();

        let profile = service.profile(&user).await.unwrap();
        assert!((profile.balance - 25.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_update_profile_applies_patch() {
        let (store, user) = seeded().await;
        let service = RecordService::new(&store, &store);

        let patch: ProfilePatch =
            serde_json::from_value(json!({"onBoarded": true, "theme": "dark"})).unwrap();
        service.update_profile(&user, &patch).await.unwrap();

        let profile = service.profile(&user).await.unwrap();
        assert!(profile.on_boarded);
        assert_eq!(profile.theme, "dark");
        assert_eq!(profile.timezone, "");
    }

    #[tokio::test]
    async fn test_replace_store_writes_store_collection() {
        let (store, user) = seeded().await;
        let service = RecordService::new(&store, &store);
        let items = vec![json!({"id": "fern"}), json!({"id": "moss"})];

        service.replace_store(&user, &items).await.unwrap();

        assert_eq!(service.store(&user).await.unwrap(), items);
        assert!(service.purchases(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_purchases() {
        let (store, user) = seeded().await;
        let service = RecordService::new(&store, &store);
        let items = vec![json!({"id": "fern", "price": 3})];

        service.replace_purchases(&user, &items).await.unwrap();
        assert_eq!(service.purchases(&user).await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = MemoryStore::new();
        let service = RecordService::new(&store, &store);
        let ghost = AuthenticatedUser {
            user_id: UserId::generate(),
            username: Username::parse("ghost").unwrap(),
        };

        assert!(matches!(
            service.profile(&ghost).await,
            Err(RecordError::UserMissing)
        ));
        assert!(matches!(
            service.set_balance(&ghost, 1.0).await,
            Err(RecordError::UserMissing)
        ));
        assert!(matches!(
            service.store(&ghost).await,
            Err(RecordError::StoreMissing)
        ));
        assert!(matches!(
            service.replace_purchases(&ghost, &[]).await,
            Err(RecordError::PurchasesMissing)
        ));
    }
}
