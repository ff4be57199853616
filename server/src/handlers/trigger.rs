//! Trigger handlers - run syncs on demand and return their reports.

use crate::error::{AppError, Result};
use crate::sync::{SyncReport, SyncService};
use marketsync_engine::PlatformId;

/// Run every registered platform.
pub async fn handle_run_all(service: &SyncService) -> SyncReport {
    service.run_once().await
}

/// Run one platform. Unknown platforms are a configuration error.
pub async fn handle_run_platform(service: &SyncService, platform: &str) -> Result<SyncReport> {
    Ok(service.run_platform(&PlatformId::new(platform)).await?)
}

/// Refresh one platform's brands and categories.
pub async fn handle_run_catalog(service: &SyncService, platform: &str) -> Result<SyncReport> {
    Ok(service.run_catalog(&PlatformId::new(platform)).await?)
}

/// Fetch one category's attributes.
pub async fn handle_run_category_attributes(
    service: &SyncService,
    platform: &str,
    category_id: &str,
) -> Result<SyncReport> {
    if category_id.is_empty() || !category_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!(
            "category id must be numeric, got {category_id:?}"
        )));
    }
    Ok(service
        .run_category_attributes(&PlatformId::new(platform), category_id)
        .await?)
}
