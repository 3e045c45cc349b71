//! Core types for Digital Garden.
//!
//! This module provides type-safe wrappers for identity concepts.

pub mod id;
pub mod username;

pub use id::{UserId, UserIdError};
pub use username::{Username, UsernameError};
