//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOP_JWT_SECRET` - Bearer token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `SHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - Listen port (default: 8080)
//! - `SHOP_UPLOAD_DIR` - Directory for uploaded photos (default: uploads)
//! - `SHOP_JWT_TTL_HOURS` - Token lifetime (default: 24)
//! - `SHOP_CLEANUP_HOUR` - UTC hour of the daily orphaned-file sweep (default: 3)
//! - `SHOP_OUTBOX_POLL_SECS` - Notification outbox poll interval (default: 10)
//! - `SHOP_OUTBOX_MAX_ATTEMPTS` - Delivery attempts before giving up (default: 5)
//! - `SHOP_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` -
//!   outgoing mail; when `SMTP_HOST` is unset emails are logged instead
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Where uploaded photos live
    pub upload_dir: PathBuf,
    pub auth: AuthConfig,
    pub jobs: JobsConfig,
    /// `None` means notifications are logged rather than mailed
    pub smtp: Option<SmtpConfig>,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Bearer token settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub token_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

/// Background job schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobsConfig {
    /// UTC hour (0-23) of the daily orphaned-file cleanup
    pub cleanup_hour: u32,
    pub outbox_poll_interval: Duration,
    pub outbox_max_attempts: u32,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            cleanup_hour: 3,
            outbox_poll_interval: Duration::from_secs(10),
            outbox_max_attempts: 5,
        }
    }
}

/// SMTP relay settings.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOP_DATABASE_URL")?;
        let host = parse_env("SHOP_HOST", "127.0.0.1")?;
        let port = parse_env("SHOP_PORT", "8080")?;
        let upload_dir = PathBuf::from(get_env_or_default("SHOP_UPLOAD_DIR", "uploads"));

        let jwt_secret = get_validated_secret("SHOP_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "SHOP_JWT_SECRET")?;
        let token_ttl = token_ttl(parse_env("SHOP_JWT_TTL_HOURS", "24")?)?;

        let cleanup_hour: u32 = parse_env("SHOP_CLEANUP_HOUR", "3")?;
        if cleanup_hour > 23 {
            return Err(ConfigError::InvalidEnvVar(
                "SHOP_CLEANUP_HOUR".to_string(),
                format!("must be between 0 and 23 (got {cleanup_hour})"),
            ));
        }
        let jobs = JobsConfig {
            cleanup_hour,
            outbox_poll_interval: outbox_poll_interval(parse_env("SHOP_OUTBOX_POLL_SECS", "10")?)?,
            outbox_max_attempts: parse_env("SHOP_OUTBOX_MAX_ATTEMPTS", "5")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            upload_dir,
            auth: AuthConfig {
                jwt_secret,
                token_ttl,
            },
            jobs,
            smtp: SmtpConfig::from_env()?,
            json_logs: get_env_or_default("SHOP_LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };
        Ok(Some(Self {
            host,
            port: parse_env("SMTP_PORT", "587")?,
            username: get_required_env("SMTP_USERNAME")?,
            password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("SMTP_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` when neither variable is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
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

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Token lifetime from `SHOP_JWT_TTL_HOURS`.
fn token_ttl(hours: u64) -> Result<Duration, ConfigError> {
    hours
        .checked_mul(3600)
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "SHOP_JWT_TTL_HOURS".to_string(),
                format!("must be a positive number of hours (got {hours})"),
            )
        })
}

/// Outbox poll period from `SHOP_OUTBOX_POLL_SECS`. Zero would spin the worker.
fn outbox_poll_interval(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "SHOP_OUTBOX_POLL_SECS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

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

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
