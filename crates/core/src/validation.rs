//! Input validation for registration and login payloads.
//!
//! Both checks collect every problem instead of stopping at the first one, so
//! a client can show all messages at once. The messages are user-facing and
//! part of the HTTP contract.

/// Minimum trimmed password length at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum trimmed username length.
pub const MIN_USERNAME_LENGTH: usize = crate::Username::MIN_LENGTH;

/// Message when either registration field is missing.
pub const MSG_FIELDS_REQUIRED: &str = "Username and password required.";
/// Registration username length message.
pub const MSG_REGISTER_USERNAME_LENGTH: &str = "Username needs to be at least 3 characters.";
/// Registration password length message.
pub const MSG_REGISTER_PASSWORD_LENGTH: &str = "Password needs to be at least 6 characters.";
/// Login username missing message.
pub const MSG_USERNAME_REQUIRED: &str = "Username is required.";
/// Login username length message.
pub const MSG_LOGIN_USERNAME_LENGTH: &str = "Username must be at least 3 characters.";
/// Login password missing message.
pub const MSG_PASSWORD_REQUIRED: &str = "Password is required.";
/// Login password blank message.
pub const MSG_PASSWORD_BLANK: &str = "Password cannot be empty.";

fn trimmed_len(s: &str) -> usize {
    s.trim().chars().count()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Validate registration input.
///
/// Returns an empty vector when the input is acceptable.
///
/// ```
/// use garden_core::validation::validate_registration;
///
/// assert!(validate_registration(Some("alice123"), Some("secret1")).is_empty());
/// assert_eq!(validate_registration(Some("ab"), Some("x")).len(), 2);
/// ```
#[must_use]
pub fn validate_registration(username: Option<&str>, password: Option<&str>) -> Vec<String> {
    let username = present(username);
    let password = present(password);
    let mut errors = Vec::new();

    if username.is_none() || password.is_none() {
        errors.push(MSG_FIELDS_REQUIRED.to_owned());
    }

    if username.is_none_or(|u| trimmed_len(u) < MIN_USERNAME_LENGTH) {
        errors.push(MSG_REGISTER_USERNAME_LENGTH.to_owned());
    }

    if password.is_none_or(|p| trimmed_len(p) < MIN_PASSWORD_LENGTH) {
        errors.push(MSG_REGISTER_PASSWORD_LENGTH.to_owned());
    }

    errors
}

/// Validate login input.
///
/// Returns an empty vector when the input is acceptable.
#[must_use]
pub fn validate_login(username: Option<&str>, password: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();

    match present(username) {
        None => errors.push(MSG_USERNAME_REQUIRED.to_owned()),
        Some(u) if trimmed_len(u) < MIN_USERNAME_LENGTH => {
            errors.push(MSG_LOGIN_USERNAME_LENGTH.to_owned());
        }
        Some(_) => {}
    }

    match present(password) {
        None => errors.push(MSG_PASSWORD_REQUIRED.to_owned()),
        Some(p) if p.trim().is_empty() => errors.push(MSG_PASSWORD_BLANK.to_owned()),
        Some(_) => {}
    }

    errors
}
