//! Sync trigger and status routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::handlers::{
    handle_run_all, handle_run_catalog, handle_run_category_attributes, handle_run_platform,
    handle_status, StatusResponse,
};
use crate::sync::SyncReport;
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/run", post(run_all_handler))
        .route("/sync/run/{platform}", post(run_platform_handler))
        .route("/sync/catalog/{platform}", post(catalog_handler))
        .route(
            "/sync/catalog/{platform}/categories/{category_id}/attributes",
            post(category_attributes_handler),
        )
        .route("/sync/status", get(status_handler))
}

/// POST /sync/run - Sync every registered platform.
async fn run_all_handler(State(state): State<AppState>) -> Json<SyncReport> {
    Json(handle_run_all(&state.service).await)
}

/// POST /sync/run/{platform} - Sync one platform.
async fn run_platform_handler(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<Json<SyncReport>> {
    let report = handle_run_platform(&state.service, &platform).await?;
    Ok(Json(report))
}

/// POST /sync/catalog/{platform} - Refresh brands and categories.
async fn catalog_handler(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<Json<SyncReport>> {
    let report = handle_run_catalog(&state.service, &platform).await?;
    Ok(Json(report))
}

/// POST /sync/catalog/{platform}/categories/{category_id}/attributes
async fn category_attributes_handler(
    State(state): State<AppState>,
    Path((platform, category_id)): Path<(String, String)>,
) -> Result<Json<SyncReport>> {
    let report = handle_run_category_attributes(&state.service, &platform, &category_id).await?;
    Ok(Json(report))
}

/// GET /sync/status - Scheduler state and last run per platform.
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let scheduler = *state.scheduler.borrow();
    Json(handle_status(&state.service, scheduler))
}
