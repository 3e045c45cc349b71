//! Authentication service.
//!
//! Provides account registration and password login. Both return a signed
//! bearer token together with the account's profile.

mod error;
mod password;
mod token;

pub use error::AuthError;
pub use password::PasswordHasher;
pub use token::{Claims, TokenError, TokenIssuer};

use chrono::Utc;

use garden_core::validation::{validate_login, validate_registration};
use garden_core::{UserId, Username};

use crate::db::{CredentialStore, ProvisioningTransaction, RepositoryError, UserDataStore};
use crate::models::{NewUser, Profile};

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// ID shared by the user and its documents.
    pub user_id: UserId,
    /// Signed bearer token.
    pub token: String,
    /// The user's profile document.
    pub profile: Profile,
}

/// Authentication service.
///
/// Borrows the stores and crypto helpers from application state for the
/// duration of a request.
pub struct AuthService<'a> {
    credentials: &'a dyn CredentialStore,
    records: &'a dyn UserDataStore,
    hasher: &'a PasswordHasher,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        credentials: &'a dyn CredentialStore,
        records: &'a dyn UserDataStore,
        hasher: &'a PasswordHasher,
        tokens: &'a TokenIssuer,
    ) -> Self {
        Self {
            credentials,
            records,
            hasher,
            tokens,
        }
    }

    /// Register a new account.
    ///
    /// Creates the user, profile, store and purchase ledger in one
    /// provisioning transaction and returns a token for the new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the input is rejected.
    /// Returns `AuthError::DuplicateUsername` if the username is taken, including
    /// when a concurrent registration wins the race.
    /// Returns `AuthError::Repository` if provisioning fails; nothing is persisted.
    pub async fn register(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let errors = validate_registration(username, password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let (Some(username), Some(password)) = (username, password) else {
            return Err(AuthError::Validation(validate_registration(None, None)));
        };

        let username =
            Username::parse(username).map_err(|e| AuthError::Validation(vec![e.to_string()]))?;

        // Fast path only; the store's unique constraint is the real guard
        if self.credentials.find_by_username(&username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = self.hasher.hash_blocking(password.to_owned()).await?;

        let now = Utc::now();
        let user = NewUser {
            id: UserId::generate(),
            username: username.clone(),
            password_hash,
            created_at: now,
        };
        let profile = Profile::new_for(username, now);

        self.provision(&user, &profile).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::DuplicateUsername,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "Account provisioned");

        let token = self.tokens.issue(user.id, &user.username)?;

        Ok(AuthSession {
            user_id: user.id,
            token,
            profile,
        })
    }

    /// Apply the four provisioning inserts atomically.
    async fn provision(&self, user: &NewUser, profile: &Profile) -> Result<(), RepositoryError> {
        let mut tx = self.credentials.begin().await?;

        match stage_account(tx.as_mut(), user, profile).await {
            Ok(()) => tx.commit().await,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Provisioning rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Log in with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the input is rejected.
    /// Returns `AuthError::InvalidCredentials` for an unknown user or wrong password.
    /// Returns `AuthError::ProfileMissing` if the user has no profile.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let errors = validate_login(username, password);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }
        let (Some(username), Some(password)) = (username, password) else {
            return Err(AuthError::Validation(validate_login(None, None)));
        };

        let user = match Username::parse(username) {
            Ok(username) => self.credentials.find_by_username(&username).await?,
            Err(_) => None,
        };

        // Unknown users still pay for a verification
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let verified = self
            .hasher
            .verify_blocking(password.to_owned(), stored_hash)
            .await?;

        let user = match user {
            Some(user) if verified => user,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let profile = self
            .records
            .profile(user.id)
            .await?
            .ok_or(AuthError::ProfileMissing)?;

        let token = self.tokens.issue(user.id, &user.username)?;

        Ok(AuthSession {
            user_id: user.id,
            token,
            profile,
        })
    }
}

async fn stage_account(
    tx: &mut dyn ProvisioningTransaction,
    user: &NewUser,
    profile: &Profile,
) -> Result<(), RepositoryError> {
    tx.insert_user(user).await?;
    tx.insert_profile(user.id, profile).await?;
    tx.insert_store(user.id, &[]).await?;
    tx.insert_purchases(user.id, &[]).await?;
    Ok(())
}
