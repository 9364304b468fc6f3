//! Daily removal of photos no record references.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use tokio::sync::watch;

use crate::db::Repositories;
use crate::error::Result;
use crate::services::storage::{CleanupReport, FileStorage};

/// Photo names referenced by products, plants and blogs.
///
/// # Errors
///
/// Returns repository errors.
pub async fn referenced_photos(repos: &Repositories) -> Result<HashSet<String>> {
    let mut names: HashSet<String> = repos.products.photo_names().await?.into_iter().collect();
    names.extend(repos.plants.photo_names().await?);
    names.extend(repos.blogs.photo_names().await?);
    Ok(names)
}

/// Delete every unreferenced file in the upload directory.
///
/// # Errors
///
/// Returns repository errors or a storage error if the directory cannot be read.
#[tracing::instrument(skip_all)]
pub async fn cleanup_orphaned_photos(
    repos: &Repositories,
    storage: &FileStorage,
) -> Result<CleanupReport> {
    let referenced = referenced_photos(repos).await?;
    let report = storage.cleanup_orphans(&referenced).await?;
    tracing::info!(
        referenced = referenced.len(),
        deleted = report.deleted.len(),
        failed = report.failed,
        "Orphaned photo cleanup finished"
    );
    Ok(report)
}

/// Time from `now` until the next `hour`:00 UTC. Never zero.
#[must_use]
pub fn duration_until_next_run(now: DateTime<Utc>, hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now {
        today
    } else {
        today + TimeDelta::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::from_secs(1))
}

/// Run the cleanup every day at `hour` UTC until `shutdown` flips.
pub async fn run_daily(
    repos: Repositories,
    storage: FileStorage,
    hour: u32,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let wait = duration_until_next_run(Utc::now(), hour);
        tracing::debug!(wait_secs = wait.as_secs(), "Next photo cleanup scheduled");
        tokio::select! {
            () = tokio::time::sleep(wait) => {
                if let Err(e) = cleanup_orphaned_photos(&repos, &storage).await {
                    tracing::error!(error = %e, "Orphaned photo cleanup failed");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use succulent_shop_core::ProductType;
    use succulent_shop_core::product::ProductDraft;

    use super::*;

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 1, 30, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 3), Duration::from_secs(90 * 60));
    }

    #[test]
    fn test_next_run_tomorrow_when_hour_passed() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 3), Duration::from_secs(24 * 3600));
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 22, 0, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 3), Duration::from_secs(5 * 3600));
    }

    #[tokio::test]
    async fn test_cleanup_keeps_product_photos() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let repos = Repositories::in_memory();

        let draft = ProductDraft {
            name: "Watering can".to_owned(),
            description: "Brass".to_owned(),
            product_type: ProductType::Decor,
            plant_id: None,
            is_pot: false,
            pot_size: None,
            pot_type: None,
            pot_number: 0,
            tool_type: None,
            base_price: Decimal::new(1500, 2),
            quantity: 1,
            active: true,
        };
        repos.products.insert(&draft, Some("kept.png")).await.unwrap();
        for name in ["kept.png", "stale.png"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let report = cleanup_orphaned_photos(&repos, &storage).await.unwrap();
        assert_eq!(report.deleted, ["stale.png"]);
        assert!(dir.path().join("kept.png").exists());
    }
}
