//! Digital Garden Core - Shared identity types and input validation.
//!
//! This crate provides the types used across all Digital Garden components:
//! - `server` - Authentication and per-user record API
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for user IDs and normalized usernames
//! - [`validation`] - Registration and login input checks that collect every problem

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
