//! Authentication service.
//!
//! Password registration/login and bearer JWT issue/verification.

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use succulent_shop_core::requests::{LoginRequest, RegisterRequest};
use succulent_shop_core::{Email, Role, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::models::User;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token missing, malformed, expired or badly signed.
    #[error("invalid token")]
    InvalidToken,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token signing error.
    #[error("token signing error")]
    TokenIssue,
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `user`, valid for the configured TTL from `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> std::result::Result<String, AuthError> {
        let ttl = i64::try_from(self.ttl.as_secs()).map_err(|_| AuthError::TokenIssue)?;
        let claims = Claims {
            sub: user.id.as_i64(),
            role: user.role,
            iat: now.timestamp(),
            exp: now.timestamp() + ttl,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| AuthError::TokenIssue)
    }

    /// Check signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any rejected token.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AuthError::InvalidToken
            })
    }
}

/// Body returned by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
}

/// Registration and login.
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
    keys: &'a JwtKeys,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository, keys: &'a JwtKeys) -> Self {
        Self { users, keys }
    }

    /// Register a `USER` account and sign a token for it.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `UserAlreadyExists` for a taken email, or
    /// hashing/signing failures.
    #[tracing::instrument(skip(self, request))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let draft = request.validate()?;
        let password = draft
            .password
            .as_deref()
            .ok_or_else(|| AppError::InvalidData("Password cannot be empty".to_owned()))?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .insert(&draft, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.respond(user)
    }

    /// Check credentials and sign a token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown email or wrong password.
    #[tracing::instrument(skip(self, request))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let email = Email::parse(&request.email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .users
            .get_by_email(&email)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&request.password, &user.password_hash)?;
        tracing::info!(user_id = %user.id, "User logged in");
        self.respond(user)
    }

    fn respond(&self, user: User) -> Result<AuthResponse> {
        let access_token = self.keys.issue(&user, Utc::now())?;
        Ok(AuthResponse {
            access_token,
            token_type: "Bearer",
            expires_in: self.keys.ttl().as_secs(),
            user,
        })
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> std::result::Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unreadable hash.
pub fn verify_password(password: &str, hash: &str) -> std::result::Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
