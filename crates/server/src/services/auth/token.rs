//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs. They are stateless: nothing is stored server side,
//! so a token stays valid until it expires.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use garden_core::{UserId, Username};

use crate::models::AuthenticatedUser;

/// Why a token was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token's `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// The token is not a well-formed JWT with the expected claims.
    #[error("token malformed")]
    Malformed,

    /// The signature does not match the server secret.
    #[error("token signature invalid")]
    BadSignature,

    /// The token could not be signed.
    #[error("token signing failed")]
    Signing,
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject user.
    pub user_id: UserId,
    /// Subject username.
    pub username: Username,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Issues and verifies tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer for the given secret and lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    /// Issue a token for a user, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, user_id: UserId, username: &Username) -> Result<String, TokenError> {
        self.issue_at(user_id, username, Utc::now())
    }

    /// Issue a token as if it had been signed at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_at(
        &self,
        user_id: UserId,
        username: &Username,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|_| TokenError::Signing)?;
        let claims = Claims {
            user_id,
            username: username.clone(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            TokenError::Signing
        })
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the [`TokenError`] describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::BadSignature
                }
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(SECRET), Duration::from_secs(3600))
    }

    fn alice() -> Username {
        Username::parse("alice123").unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = issuer();
        let id = UserId::generate();
        let token = issuer.issue(id, &alice()).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.user_id, id);
        assert_eq!(claims.username, alice());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_claims_use_camel_case() {
        let token = issuer().issue(UserId::generate(), &alice()).unwrap();
        let data = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert!(data.claims.get("userId").is_some());
        assert_eq!(data.claims["username"], "alice123");
        assert!(data.claims.get("user_id").is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let issued_at = Utc::now() - chrono::Duration::hours(2);
        let token = issuer
            .issue_at(UserId::generate(), &alice(), issued_at)
            .unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer().issue(UserId::generate(), &alice()).unwrap();
        let other = TokenIssuer::new(
            &SecretString::from("zZ9*yY8&xX7^wW6%vV5$uU4#tT3@sS2!"),
            Duration::from_secs(3600),
        );

        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let issuer = issuer();
        let token = issuer.issue(UserId::generate(), &alice()).unwrap();
        let (head, sig) = token.rsplit_once('.').unwrap();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{head}.{flipped}{}", &sig[1..]);

        assert_eq!(issuer.verify(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = issuer();
        assert_eq!(issuer.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(issuer.verify(""), Err(TokenError::Malformed));
    }
}
