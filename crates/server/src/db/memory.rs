//! In-process account store.
//!
//! Backs the test suites and local experiments. Follows the same rules as the
//! `PostgreSQL` store: usernames are unique case-insensitively and provisioning
//! is applied all at once on commit.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use garden_core::{UserId, Username};

use super::{CredentialStore, ProvisioningTransaction, RepositoryError, UserDataStore};
use crate::models::{Item, NewUser, Profile, ProfilePatch, UserRecord};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserRecord>,
    profiles: HashMap<UserId, Profile>,
    stores: HashMap<UserId, Vec<Item>>,
    purchases: HashMap<UserId, Vec<Item>>,
}

impl Tables {
    fn username_taken(&self, username: &Username) -> bool {
        self.users
            .values()
            .any(|u| u.username.as_str().eq_ignore_ascii_case(username.as_str()))
    }
}

/// Account store held in memory.
///
/// Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed user records.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.tables.lock().users.len()
    }

    /// Number of committed documents as `(profiles, stores, purchases)`.
    #[must_use]
    pub fn document_counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.lock();
        (
            tables.profiles.len(),
            tables.stores.len(),
            tables.purchases.len(),
        )
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let tables = self.tables.lock();
        Ok(tables
            .users
            .values()
            .find(|u| u.username.as_str().eq_ignore_ascii_case(username.as_str()))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.tables.lock().users.get(&id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn ProvisioningTransaction>, RepositoryError> {
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            staged: Staged::default(),
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[derive(Default)]
struct Staged {
    user: Option<NewUser>,
    profile: Option<(UserId, Profile)>,
    store: Option<(UserId, Vec<Item>)>,
    purchases: Option<(UserId, Vec<Item>)>,
}

/// Inserts are buffered until commit; dropping the transaction drops the buffer.
struct MemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    staged: Staged,
}

#[async_trait]
impl ProvisioningTransaction for MemoryTransaction {
    async fn insert_user(&mut self, user: &NewUser) -> Result<(), RepositoryError> {
        if self.tables.lock().username_taken(&user.username) {
            return Err(RepositoryError::Conflict("username already exists".to_owned()));
        }
        self.staged.user = Some(user.clone());
        Ok(())
    }

    async fn insert_profile(
        &mut self,
        id: UserId,
        profile: &Profile,
    ) -> Result<(), RepositoryError> {
        self.staged.profile = Some((id, profile.clone()));
        Ok(())
    }

    async fn insert_store(&mut self, id: UserId, items: &[Item]) -> Result<(), RepositoryError> {
        self.staged.store = Some((id, items.to_vec()));
        Ok(())
    }

    async fn insert_purchases(
        &mut self,
        id: UserId,
        items: &[Item],
    ) -> Result<(), RepositoryError> {
        self.staged.purchases = Some((id, items.to_vec()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self { tables, staged } = *self;
        let mut tables = tables.lock();

        // Re-check under the lock: another transaction may have committed the
        // same username since `insert_user` ran.
        if let Some(user) = &staged.user {
            if tables.username_taken(&user.username) {
                return Err(RepositoryError::Conflict("username already exists".to_owned()));
            }
            if tables.users.contains_key(&user.id) {
                return Err(RepositoryError::Conflict("user id already exists".to_owned()));
            }
        }

        if let Some(user) = staged.user {
            tables.users.insert(user.id, user.into());
        }
        if let Some((id, profile)) = staged.profile {
            tables.profiles.insert(id, profile);
        }
        if let Some((id, items)) = staged.store {
            tables.stores.insert(id, items);
        }
        if let Some((id, items)) = staged.purchases {
            tables.purchases.insert(id, items);
        }

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl UserDataStore for MemoryStore {
    async fn profile(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.tables.lock().profiles.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        patch: &ProfilePatch,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        Ok(tables.profiles.get_mut(&id).is_some_and(|profile| {
            patch.apply_to(profile);
            true
        }))
    }

    async fn set_balance(&self, id: UserId, balance: f64) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        Ok(tables.profiles.get_mut(&id).is_some_and(|profile| {
            profile.balance = balance;
            true
        }))
    }

    async fn store_items(&self, id: UserId) -> Result<Option<Vec<Item>>, RepositoryError> {
        Ok(self.tables.lock().stores.get(&id).cloned())
    }

    async fn replace_store_items(
        &self,
        id: UserId,
        items: &[Item],
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        Ok(tables.stores.get_mut(&id).is_some_and(|store| {
            *store = items.to_vec();
            true
        }))
    }

    async fn purchases(&self, id: UserId) -> Result<Option<Vec<Item>>, RepositoryError> {
        Ok(self.tables.lock().purchases.get(&id).cloned())
    }

    async fn replace_purchases(
        &self,
        id: UserId,
        items: &[Item],
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock();
        Ok(tables.purchases.get_mut(&id).is_some_and(|ledger| {
            *ledger = items.to_vec();
            true
        }))
    }
}
