//! Marketsync Server binary.

use marketsync_engine::Reconciler;
use marketsync_server::config::Config;
use marketsync_server::scheduler::Scheduler;
use marketsync_server::sync::SyncService;
use marketsync_server::{build_registry, build_router, db, AppState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketsync_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Marketsync Server on {}:{}", config.host, config.port);

    let registry = build_registry(&config)?;
    if registry.is_empty() {
        tracing::warn!("No marketplace credentials configured, sync runs will be empty");
    }

    let mut service = SyncService::new(registry, Reconciler::new(config.sync.write_policy));

    if let Some(database_url) = &config.database_url {
        let pool = db::create_pool(database_url).await?;

        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;

        service = service.with_pool(pool);
        service.load_from_database().await?;
    } else {
        tracing::info!("DATABASE_URL not set, keeping entities in memory only");
    }

    let service = Arc::new(service);

    // Start the scheduler
    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(Arc::clone(&service), config.sync.clone(), cancel.clone());
    let scheduler_state = scheduler.subscribe();
    let scheduler_task = scheduler.spawn();

    let app = build_router(AppState {
        service,
        scheduler: scheduler_state,
    });

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            shutdown.cancel();
        })
        .await?;

    cancel.cancel();
    scheduler_task.await?;

    Ok(())
}
