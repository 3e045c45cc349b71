//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GARDEN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `GARDEN_JWT_SECRET` - Token signing secret (min 32 chars, high entropy; falls back to `JWT_SECRET`)
//!
//! ## Optional
//! - `GARDEN_HOST` - Bind address (default: 127.0.0.1)
//! - `GARDEN_PORT` - Listen port (falls back to `PORT`, default: 5000)
//! - `GARDEN_ENV` - `development` or `production` (default: production)
//! - `GARDEN_TOKEN_TTL_SECS` - Bearer token lifetime (default: 3600)
//! - `GARDEN_ARGON2_MEMORY_KIB` - Argon2 memory cost
//! - `GARDEN_ARGON2_ITERATIONS` - Argon2 time cost
//! - `GARDEN_ARGON2_PARALLELISM` - Argon2 lanes
//! - `GARDEN_BODY_LIMIT_BYTES` - Maximum request body size (default: 1 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TOKEN_TTL_SECS: u64 = 60 * 60;
const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development; enables the request simulation middleware.
    Development,
    #[default]
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Argon2 work factor.
///
/// `None` leaves the argon2 crate default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB.
    pub memory_kib: Option<u32>,
    /// Number of passes.
    pub iterations: Option<u32>,
    /// Degree of parallelism.
    pub parallelism: Option<u32>,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Bearer token signing secret
    pub jwt_secret: SecretString,
    /// How long an issued token stays valid
    pub token_ttl: Duration,
    /// Password hashing work factor
    pub password_hash: PasswordHashConfig,
    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(&|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_vars(vars: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get_with_fallback(vars, "GARDEN_DATABASE_URL", "DATABASE_URL")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("GARDEN_DATABASE_URL".to_string()))?;

        let host = parse_or_default(vars, "GARDEN_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?;
        let port = match get_with_fallback(vars, "GARDEN_PORT", "PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                ConfigError::InvalidEnvVar("GARDEN_PORT".to_string(), e.to_string())
            })?,
            None => 5000,
        };
        let environment = match vars("GARDEN_ENV") {
            Some(raw) => raw
                .parse::<Environment>()
                .map_err(|e| ConfigError::InvalidEnvVar("GARDEN_ENV".to_string(), e))?,
            None => Environment::default(),
        };

        let jwt_secret = get_with_fallback(vars, "GARDEN_JWT_SECRET", "JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("GARDEN_JWT_SECRET".to_string()))?;
        validate_secret_strength(&jwt_secret, "GARDEN_JWT_SECRET")?;
        let jwt_secret = SecretString::from(jwt_secret);
        validate_jwt_secret(&jwt_secret, "GARDEN_JWT_SECRET")?;

        let token_ttl = Duration::from_secs(parse_or_default(
            vars,
            "GARDEN_TOKEN_TTL_SECS",
            DEFAULT_TOKEN_TTL_SECS,
        )?);

        let password_hash = PasswordHashConfig {
            memory_kib: parse_optional(vars, "GARDEN_ARGON2_MEMORY_KIB")?,
            iterations: parse_optional(vars, "GARDEN_ARGON2_ITERATIONS")?,
            parallelism: parse_optional(vars, "GARDEN_ARGON2_PARALLELISM")?,
        };

        let body_limit_bytes =
            parse_or_default(vars, "GARDEN_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?;

        Ok(Self {
            database_url,
            host,
            port,
            environment,
            jwt_secret,
            token_ttl,
            password_hash,
            body_limit_bytes,
            sentry_dsn: vars("SENTRY_DSN"),
            sentry_environment: vars("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(vars, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_or_default(vars, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether development-only behaviour is enabled.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable, falling back to a generic name (e.g. `DATABASE_URL` set by the host platform).
fn get_with_fallback(
    vars: &dyn Fn(&str) -> Option<String>,
    primary_key: &str,
    fallback_key: &str,
) -> Option<String> {
    vars(primary_key).or_else(|| vars(fallback_key))
}

/// Parse a variable if present, otherwise use the default.
fn parse_or_default<T>(
    vars: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(vars, key)?.unwrap_or(default))
}

/// Parse an optional variable.
fn parse_optional<T>(
    vars: &dyn Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    vars(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Validate that the signing secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn vars_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GARDEN_DATABASE_URL", "postgres://localhost/garden"),
            ("GARDEN_JWT_SECRET", STRONG_SECRET),
        ]
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_counts_characters() {
        // Two-byte characters weigh the same as ASCII ones
        let entropy = shannon_entropy("aä");
        assert!((entropy - 1.0).abs() < 0.01);
        assert!((shannon_entropy("äöüß") - shannon_entropy("abcd")).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-secret-goes-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"a".repeat(40), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_jwt_secret_too_short() {
        let secret = SecretString::from("aB3$xY9!");
        assert!(validate_jwt_secret(&secret, "TEST_VAR").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(&vars_from(&minimal())).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.body_limit_bytes, 1024 * 1024);
        assert_eq!(config.password_hash, PasswordHashConfig::default());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_fallback_variables() {
        let config = ServerConfig::from_vars(&vars_from(&[
            ("DATABASE_URL", "postgres://fallback/garden"),
            ("JWT_SECRET", STRONG_SECRET),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://fallback/garden"
        );
    }

    #[test]
    fn test_missing_secret() {
        let result = ServerConfig::from_vars(&vars_from(&[(
            "GARDEN_DATABASE_URL",
            "postgres://localhost/garden",
        )]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(key)) if key == "GARDEN_JWT_SECRET"
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = minimal();
        pairs.push(("GARDEN_PORT", "not-a-port"));
        let result = ServerConfig::from_vars(&vars_from(&pairs));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_development_environment_and_argon2_params() {
        let mut pairs = minimal();
        pairs.push(("GARDEN_ENV", "development"));
        pairs.push(("GARDEN_ARGON2_MEMORY_KIB", "8192"));
        pairs.push(("GARDEN_ARGON2_ITERATIONS", "3"));
        let config = ServerConfig::from_vars(&vars_from(&pairs)).unwrap();

        assert!(config.is_development());
        assert_eq!(config.password_hash.memory_kib, Some(8192));
        assert_eq!(config.password_hash.iterations, Some(3));
        assert_eq!(config.password_hash.parallelism, None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ServerConfig::from_vars(&vars_from(&minimal())).unwrap();
        let debug_output = format!("{config:?}");

        assert!(!debug_output.contains(STRONG_SECRET));
        assert!(!debug_output.contains("postgres://localhost/garden"));
    }
}
