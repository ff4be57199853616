//! Marketsync Server - marketplace synchronization service.
//!
//! Pulls orders, products, claims, settlements, questions and catalog data
//! from marketplace APIs on a schedule and on demand, and reconciles them
//! into a keyed store with the marketsync-engine reconciliation logic.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod platform;
pub mod routes;
pub mod scheduler;
pub mod sync;

use crate::config::Config;
use crate::error::SyncError;
use crate::platform::trendyol::TrendyolClient;
use crate::platform::PlatformRegistry;
use crate::scheduler::SchedulerState;
use crate::sync::SyncService;
use axum::Router;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SyncService>,
    pub scheduler: watch::Receiver<SchedulerState>,
}

/// Build the HTTP application.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Register a client for every platform that has credentials configured.
pub fn build_registry(config: &Config) -> Result<PlatformRegistry, SyncError> {
    let mut registry = PlatformRegistry::new();

    if let Some(trendyol) = &config.trendyol {
        let client = TrendyolClient::new(trendyol, config.http_timeout)?;
        registry.register(Arc::new(client));
    }

    Ok(registry)
}
