//! Domain models for the server.
//!
//! # Documents
//!
//! Every account owns four documents keyed by the same [`garden_core::UserId`]:
//!
//! - `user` - credentials ([`UserRecord`])
//! - `profile` - user-facing settings and balance ([`Profile`])
//! - `store` - unlocked store items
//! - `purchases` - purchase ledger
//!
//! Store and purchase items are opaque JSON values owned by the client.

pub mod profile;
pub mod session;
pub mod user;

pub use profile::{Profile, ProfilePatch};
pub use session::AuthenticatedUser;
pub use user::{NewUser, UserRecord};

/// An opaque store or purchase item.
pub type Item = serde_json::Value;
