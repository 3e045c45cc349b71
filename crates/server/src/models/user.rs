//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use garden_core::{UserId, Username};

/// A registered user (domain type).
///
/// Deliberately not `Serialize`: the password hash never leaves the server.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized username.
    pub username: Username,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// A user about to be inserted during provisioning.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Pre-generated ID shared by all of the account's documents.
    pub id: UserId,
    /// Normalized username.
    pub username: Username,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<NewUser> for UserRecord {
    fn from(user: NewUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: user.created_at,
        }
    }
}
