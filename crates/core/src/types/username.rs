//! Normalized username type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Username`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    /// The input is empty once trimmed.
    #[error("username cannot be empty")]
    Empty,
    /// The input is shorter than the minimum length.
    #[error("username must be at least {min} characters")]
    TooShort {
        /// Minimum allowed length.
        min: usize,
    },
}

/// A username in its normalized (trimmed, lowercase) form.
///
/// Uniqueness and lookups always go through this form, which makes them
/// case-insensitive: `"Alice123"` and `"alice123"` are the same account.
///
/// ## Constraints
///
/// - Length: at least 3 characters after trimming, no upper bound beyond the
///   request body limit
///
/// ## Examples
///
/// ```
/// use garden_core::Username;
///
/// let name = Username::parse("  Alice123 ").unwrap();
/// assert_eq!(name.as_str(), "alice123");
///
/// assert!(Username::parse("ab").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Minimum length of a username.
    pub const MIN_LENGTH: usize = 3;

    /// Parse and normalize a username.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or shorter than
    /// [`Self::MIN_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, UsernameError> {
        let trimmed = s.trim();
        let len = trimmed.chars().count();

        if len == 0 {
            return Err(UsernameError::Empty);
        }

        if len < Self::MIN_LENGTH {
            return Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the normalized username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Username {
    type Err = UsernameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Username {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Username {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Stored values were normalized on the way in
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Username {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases() {
        let name = Username::parse("Alice123").unwrap();
        assert_eq!(name.as_str(), "alice123");
    }

    #[test]
    fn test_parse_trims() {
        let name = Username::parse("  bob  ").unwrap();
        assert_eq!(name.as_str(), "bob");
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Username::parse("   "), Err(UsernameError::Empty)));
    }

    #[test]
    fn test_parse_too_short() {
        assert!(matches!(
            Username::parse("ab"),
            Err(UsernameError::TooShort { min: 3 })
        ));
    }

    #[test]
    fn test_parse_long_name_accepted() {
        let long = "A".repeat(500);
        let name = Username::parse(&long).unwrap();
        assert_eq!(name.as_str(), "a".repeat(500));
    }

    #[test]
    fn test_length_counts_characters() {
        // Three characters, six bytes
        assert!(Username::parse("äöü").is_ok());
    }

    #[test]
    fn test_case_variants_are_equal() {
        assert_eq!(
            Username::parse("GardenFan").unwrap(),
            Username::parse("gardenfan").unwrap()
        );
    }
}
