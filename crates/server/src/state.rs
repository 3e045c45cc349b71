//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::{CredentialStore, UserDataStore};
use crate::services::auth::{AuthError, PasswordHasher, TokenIssuer};
use crate::services::{AuthService, RecordService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the stores, the signing key and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    credentials: Arc<dyn CredentialStore>,
    records: Arc<dyn UserDataStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `credentials` - User credential store
    /// * `records` - Profile, store and purchase document store
    ///
    /// # Errors
    ///
    /// Returns an error if the password hashing parameters are invalid.
    pub fn new(
        config: ServerConfig,
        credentials: Arc<dyn CredentialStore>,
        records: Arc<dyn UserDataStore>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(&config.password_hash)?;
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                credentials,
                records,
                hasher,
                tokens,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.inner.credentials.as_ref()
    }

    /// Get a reference to the token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.inner.credentials.as_ref(),
            self.inner.records.as_ref(),
            &self.inner.hasher,
            &self.inner.tokens,
        )
    }

    /// Record service bound to this state.
    #[must_use]
    pub fn records(&self) -> RecordService<'_> {
        RecordService::new(self.inner.credentials.as_ref(), self.inner.records.as_ref())
    }
}
