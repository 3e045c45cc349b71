//! Argon2id password hashing.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

use super::AuthError;
use crate::config::PasswordHashConfig;

/// Plaintext hashed once at startup so unknown-user logins cost a real verify.
const DUMMY_PASSWORD: &str = "garden-timing-equalizer";

/// Salted Argon2id hasher with a configurable work factor.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Build a hasher from configured cost parameters.
    ///
    /// Unset parameters fall back to the `argon2` crate defaults.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the parameters are out of range.
    pub fn new(config: &PasswordHashConfig) -> Result<Self, AuthError> {
        let params = Params::new(
            config.memory_kib.unwrap_or(Params::DEFAULT_M_COST),
            config.iterations.unwrap_or(Params::DEFAULT_T_COST),
            config.parallelism.unwrap_or(Params::DEFAULT_P_COST),
            None,
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Invalid Argon2 parameters");
            AuthError::PasswordHash
        })?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut hasher = Self {
            argon2,
            dummy_hash: String::new(),
        };
        hasher.dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(hasher)
    }

    /// Hash a password into a PHC string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    }

    /// Check a password against a PHC string.
    ///
    /// The digest comparison is constant time. A hash that cannot be parsed
    /// never matches.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Run a verification that always fails, at the same cost as a real one.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }

    /// [`Self::hash`] on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails or the task panics.
    pub async fn hash_blocking(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                AuthError::PasswordHash
            })?
    }

    /// [`Self::verify`] on the blocking thread pool.
    ///
    /// Pass `None` as the hash to run [`Self::verify_dummy`] instead.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if the task panics.
    pub async fn verify_blocking(
        &self,
        password: String,
        hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || match hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                hasher.verify_dummy(&password);
                false
            }
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            AuthError::PasswordHash
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Minimal cost so tests stay fast.
    fn fast_config() -> PasswordHashConfig {
        PasswordHashConfig {
            memory_kib: Some(1024),
            iterations: Some(1),
            parallelism: Some(1),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(&fast_config()).unwrap();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("secret2", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(&fast_config()).unwrap();
        let a = hasher.hash("secret1").unwrap();
        let b = hasher.hash("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_does_not_contain_plaintext() {
        let hasher = PasswordHasher::new(&fast_config()).unwrap();
        let hash = hasher.hash("hunter22hunter22").unwrap();
        assert!(!hash.contains("hunter22"));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let hasher = PasswordHasher::new(&fast_config()).unwrap();
        assert!(!hasher.verify("secret1", "not-a-phc-string"));
        assert!(!hasher.verify("secret1", ""));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = PasswordHashConfig {
            memory_kib: Some(1),
            iterations: Some(0),
            parallelism: Some(1),
        };
        assert!(matches!(
            PasswordHasher::new(&config),
            Err(AuthError::PasswordHash)
        ));
    }

    #[tokio::test]
    async fn test_blocking_variants() {
        let hasher = PasswordHasher::new(&fast_config()).unwrap();
        let hash = hasher.hash_blocking("secret1".to_owned()).await.unwrap();

        assert!(
            hasher
                .verify_blocking("secret1".to_owned(), Some(hash))
                .await
                .unwrap()
        );
        assert!(
            !hasher
                .verify_blocking("secret1".to_owned(), None)
                .await
                .unwrap()
        );
    }
}
