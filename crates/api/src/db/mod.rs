//! Database access for the shop.
//!
//! # Tables
//!
//! - `categories`, `plants` - Plant catalog
//! - `products` - Sellable items (base price plus sale flag)
//! - `orders`, `order_items` - Placed orders with their price snapshots
//! - `users` - Accounts and argon2 password hashes
//! - `ratings` - Product ratings
//! - `blogs`, `comments` - Blog posts and threaded comments
//! - `notifications` - Email outbox
//!
//! Every entity is reached through a repository trait so services can run
//! against [`PgStore`] in production and the in-memory store in tests.
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p succulent-shop-cli -- migrate
//! ```

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod blogs;
pub mod catalog;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod orders;
pub mod outbox;
pub mod products;
pub mod ratings;
pub mod users;

pub use blogs::{BlogRepository, CommentRepository};
pub use catalog::{CategoryRepository, PlantRepository};
pub use orders::{NewOrder, OrderRepository};
pub use outbox::OutboxRepository;
pub use products::ProductRepository;
pub use ratings::RatingRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (unique email, referenced row, concurrent update).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
pub(crate) fn map_constraint(err: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}

/// Parse an enum stored as text.
pub(crate) fn parse_column<T: FromStr>(value: &str, column: &str) -> Result<T, RepositoryError> {
    value
        .parse()
        .map_err(|_| RepositoryError::DataCorruption(format!("invalid {column} in database: {value}")))
}

/// Parse a nullable enum stored as text.
pub(crate) fn parse_optional_column<T: FromStr>(
    value: Option<&str>,
    column: &str,
) -> Result<Option<T>, RepositoryError> {
    value.map(|v| parse_column(v, column)).transpose()
}

/// Convert a `COUNT(*)` result for a page envelope.
pub(crate) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Database liveness probe used by `/health/ready`.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub plants: Arc<dyn PlantRepository>,
    pub users: Arc<dyn UserRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub blogs: Arc<dyn BlogRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub outbox: Arc<dyn OutboxRepository>,
    pub health: Arc<dyn HealthCheck>,
}

impl Repositories {
    /// Repositories backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    /// Repositories backed by a fresh in-memory store.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(memory::MemoryStore::default()))
    }

    /// Point every repository at one store.
    #[must_use]
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ProductRepository
            + OrderRepository
            + CategoryRepository
            + PlantRepository
            + UserRepository
            + RatingRepository
            + BlogRepository
            + CommentRepository
            + OutboxRepository
            + HealthCheck
            + 'static,
    {
        Self {
            products: store.clone(),
            orders: store.clone(),
            categories: store.clone(),
            plants: store.clone(),
            users: store.clone(),
            ratings: store.clone(),
            blogs: store.clone(),
            comments: store.clone(),
            outbox: store.clone(),
            health: store,
        }
    }
}
