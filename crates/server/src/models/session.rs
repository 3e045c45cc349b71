//! Request identity types.

use serde::{Deserialize, Serialize};

use garden_core::{UserId, Username};

/// Identity attached to a request once its bearer token has been verified.
///
/// Minimal data carried in the token to identify the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User's ID.
    pub user_id: UserId,
    /// User's normalized username.
    pub username: Username,
}
