//! One-off run of the orphaned photo sweep the server performs daily.

use succulent_shop_api::db::Repositories;
use succulent_shop_api::services::cleanup::cleanup_orphaned_photos;
use succulent_shop_api::services::storage::FileStorage;

use super::{CommandError, connect};

/// Delete files in `SHOP_UPLOAD_DIR` (default `uploads`) that nothing references.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    let repos = Repositories::postgres(pool);
    let upload_dir = std::env::var("SHOP_UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_owned());
    let storage = FileStorage::new(upload_dir);

    let report = cleanup_orphaned_photos(&repos, &storage).await?;
    tracing::info!(
        deleted = report.deleted.len(),
        failed = report.failed,
        "Cleanup complete"
    );
    for name in &report.deleted {
        tracing::debug!(file = %name, "Deleted");
    }
    Ok(())
}
