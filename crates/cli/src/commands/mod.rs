//! Subcommand implementations.

pub mod cleanup;
pub mod migrate;
pub mod user;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use succulent_shop_api::config::{ConfigError, get_database_url};

/// Connect using `SHOP_DATABASE_URL` (or `DATABASE_URL`).
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let url = get_database_url("SHOP_DATABASE_URL")?;
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(secrecy::ExposeSecret::expose_secret(&url))
        .await?;
    Ok(pool)
}

/// Errors shared by the subcommands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Invalid(String),

    #[error("Repository error: {0}")]
    Repository(#[from] succulent_shop_api::db::RepositoryError),

    #[error("Password hashing failed: {0}")]
    Auth(#[from] succulent_shop_api::services::auth::AuthError),

    #[error("{0}")]
    App(#[from] succulent_shop_api::error::AppError),
}
