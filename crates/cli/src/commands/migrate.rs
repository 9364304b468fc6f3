//! Database migration command.
//!
//! Applies `crates/api/migrations/` to the database named by
//! `SHOP_DATABASE_URL` (falling back to `DATABASE_URL`). Already applied
//! migrations are skipped.

use super::{CommandError, connect};

/// Apply pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
