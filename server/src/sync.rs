//! Sync orchestration.
//!
//! A run walks the registered platforms one after another and, for each, the
//! sources one after another: fetch the whole source, reconcile it into the
//! shared store, mirror the resulting writes to Postgres when configured.
//! A failing source is recorded on its platform summary and the run moves on;
//! a panicking platform is recorded the same way.
//!
//! The store lock is taken only for the synchronous reconcile of one batch and
//! for draining the write queue, never across a network call.

use crate::db;
use crate::error::SyncError;
use crate::platform::{PlatformClient, PlatformRegistry};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::FutureExt;
use marketsync_engine::{
    Entity, Mapped, MemoryStore, PendingWrite, PlatformId, ProductVariant, Reconciler, SyncResult,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Summary prefix for writes left over from earlier runs.
pub const BACKLOG_SOURCE: &str = "backlog";

/// One fetchable source of a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Orders,
    Products,
    Claims,
    Transactions,
    Questions,
    Brands,
    Categories,
}

impl Source {
    /// Sources covered by a regular (scheduled or manual) run, in run order.
    pub const TRANSACTIONAL: [Source; 5] = [
        Source::Orders,
        Source::Products,
        Source::Claims,
        Source::Transactions,
        Source::Questions,
    ];

    /// Reference data refreshed on demand.
    pub const CATALOG: [Source; 2] = [Source::Brands, Source::Categories];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Orders => "orders",
            Source::Products => "products",
            Source::Claims => "claims",
            Source::Transactions => "transactions",
            Source::Questions => "questions",
            Source::Brands => "brands",
            Source::Categories => "categories",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated outcome of one platform within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSummary {
    pub platform: PlatformId,
    pub total_fetched: usize,
    pub added_count: usize,
    pub updated_count: usize,
    /// Record, source and persistence failures, prefixed with their source
    pub errors: Vec<String>,
}

impl PlatformSummary {
    pub fn new(platform: PlatformId) -> Self {
        Self {
            platform,
            total_fetched: 0,
            added_count: 0,
            updated_count: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn absorb(&mut self, source: &str, result: &SyncResult) {
        self.total_fetched += result.fetched;
        self.added_count += result.added;
        self.updated_count += result.updated;
        self.errors
            .extend(result.errors.iter().map(|failure| format!("{source}: {failure}")));
    }

    fn source_failed(&mut self, source: &str, error: &SyncError) {
        self.errors.push(format!("{source}: {error}"));
    }
}

/// Result of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub platforms: Vec<PlatformSummary>,
}

impl SyncReport {
    pub fn summary(&self, platform: &PlatformId) -> Option<&PlatformSummary> {
        self.platforms.iter().find(|s| &s.platform == platform)
    }
}

/// Runs syncs against the registered platforms.
pub struct SyncService {
    registry: PlatformRegistry,
    reconciler: Reconciler,
    store: Arc<Mutex<MemoryStore>>,
    pool: Option<PgPool>,
    /// Last regular-run summary per platform
    last_summaries: DashMap<PlatformId, PlatformSummary>,
}

impl SyncService {
    pub fn new(registry: PlatformRegistry, reconciler: Reconciler) -> Self {
        Self {
            registry,
            reconciler,
            store: Arc::new(Mutex::new(MemoryStore::new())),
            pool: None,
            last_summaries: DashMap::new(),
        }
    }

    /// Mirror every write into Postgres.
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    /// Shared handle to the in-memory store.
    pub fn store(&self) -> Arc<Mutex<MemoryStore>> {
        Arc::clone(&self.store)
    }

    /// Fill the store from Postgres. Loaded rows are not written back.
    pub async fn load_from_database(&self) -> Result<usize, sqlx::Error> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };
        let rows = db::load_entities(pool).await?;
        let loaded = self.lock_store().import(rows.iter().map(db::StoredEntity::to_record));
        tracing::info!(loaded, "Loaded entities from database");
        Ok(loaded)
    }

    /// Run every registered platform to completion.
    pub async fn run_once(&self) -> SyncReport {
        self.run_all(&CancellationToken::new()).await
    }

    /// Run every registered platform, stopping between platforms and sources
    /// once `cancel` fires.
    pub async fn run_all(&self, cancel: &CancellationToken) -> SyncReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, platforms = self.registry.len(), "Sync run started");

        let mut platforms = Vec::new();
        for platform in self.registry.platforms() {
            if cancel.is_cancelled() {
                tracing::info!(%run_id, "Sync run cancelled");
                break;
            }
            let client = match self.registry.get(&platform) {
                Ok(client) => client,
                Err(e) => {
                    let mut summary = PlatformSummary::new(platform);
                    summary.source_failed("platform", &e);
                    platforms.push(summary);
                    continue;
                }
            };
            platforms.push(self.isolated(client.as_ref(), &Source::TRANSACTIONAL, cancel).await);
        }

        self.finish(run_id, started_at, platforms, true)
    }

    /// Run one platform's regular sources.
    pub async fn run_platform(&self, platform: &PlatformId) -> Result<SyncReport, SyncError> {
        let client = self.registry.get(platform)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, platform = %platform, "Platform sync started");

        let summary = self
            .isolated(client.as_ref(), &Source::TRANSACTIONAL, &CancellationToken::new())
            .await;
        Ok(self.finish(run_id, started_at, vec![summary], true))
    }

    /// Refresh one platform's brands and category tree.
    pub async fn run_catalog(&self, platform: &PlatformId) -> Result<SyncReport, SyncError> {
        let client = self.registry.get(platform)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(%run_id, platform = %platform, "Catalog sync started");

        let summary = self
            .isolated(client.as_ref(), &Source::CATALOG, &CancellationToken::new())
            .await;
        Ok(self.finish(run_id, started_at, vec![summary], false))
    }

    /// Fetch one category's attribute definitions and merge them into it.
    pub async fn run_category_attributes(
        &self,
        platform: &PlatformId,
        category_id: &str,
    ) -> Result<SyncReport, SyncError> {
        let client = self.registry.get(platform)?;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(
            %run_id,
            platform = %platform,
            category_id,
            "Category attribute sync started"
        );

        let mut summary = PlatformSummary::new(platform.clone());
        let mut deferred = Vec::new();
        self.retry_backlog(&mut summary, &mut deferred).await;

        let outcome = match client.fetch_category_attributes(category_id).await {
            Ok(batch) => Ok(self.reconcile(batch)),
            Err(e) => Err(e),
        };
        self.record(&mut summary, "categoryAttributes", outcome, &mut deferred).await;
        self.requeue(deferred);

        Ok(self.finish(run_id, started_at, vec![summary], false))
    }

    /// Last regular-run summary of every platform that has run, by platform.
    pub fn last_summaries(&self) -> Vec<PlatformSummary> {
        let mut summaries: Vec<_> = self
            .last_summaries
            .iter()
            .map(|e| e.value().clone())
            .collect();
        summaries.sort_by(|a, b| a.platform.cmp(&b.platform));
        summaries
    }

    /// Sync the given sources of one platform, turning a panic into a
    /// summary error so the remaining platforms still run.
    ///
    /// Writes that could not be mirrored are held back until the platform is
    /// done, so later sources only flush what they produced themselves.
    async fn isolated(
        &self,
        client: &dyn PlatformClient,
        sources: &[Source],
        cancel: &CancellationToken,
    ) -> PlatformSummary {
        let platform = client.platform().clone();
        let mut deferred = Vec::new();
        let outcome = AssertUnwindSafe(self.sync_sources(client, sources, cancel, &mut deferred))
            .catch_unwind()
            .await;
        self.requeue(deferred);

        match outcome {
            Ok(summary) => summary,
            Err(_) => {
                tracing::error!(platform = %platform, "Platform sync panicked");
                let mut summary = PlatformSummary::new(platform);
                summary.errors.push("sync panicked".to_string());
                summary
            }
        }
    }

    async fn sync_sources(
        &self,
        client: &dyn PlatformClient,
        sources: &[Source],
        cancel: &CancellationToken,
        deferred: &mut Vec<PendingWrite>,
    ) -> PlatformSummary {
        let mut summary = PlatformSummary::new(client.platform().clone());
        self.retry_backlog(&mut summary, deferred).await;

        for &source in sources {
            if cancel.is_cancelled() {
                tracing::info!(
                    platform = %summary.platform,
                    next = %source,
                    "Sync cancelled between sources"
                );
                break;
            }
            let outcome = self.fetch_and_reconcile(client, source).await;
            self.record(&mut summary, source.as_str(), outcome, deferred).await;
        }

        summary
    }

    async fn fetch_and_reconcile(
        &self,
        client: &dyn PlatformClient,
        source: Source,
    ) -> Result<SyncResult, SyncError> {
        let result = match source {
            Source::Orders => self.reconcile(client.fetch_orders().await?),
            Source::Products => self.reconcile_products(client.fetch_products().await?),
            Source::Claims => self.reconcile(client.fetch_claims().await?),
            Source::Transactions => self.reconcile(client.fetch_transactions().await?),
            Source::Questions => self.reconcile(client.fetch_questions().await?),
            Source::Brands => self.reconcile(client.fetch_brands().await?),
            Source::Categories => self.reconcile(client.fetch_categories().await?),
        };
        Ok(result)
    }

    fn reconcile<E: Entity>(&self, batch: Vec<Mapped<E>>) -> SyncResult {
        let now = now_millis();
        let mut store = self.lock_store();
        self.reconciler.reconcile(&mut *store, batch, now)
    }

    fn reconcile_products(&self, rows: Vec<Mapped<ProductVariant>>) -> SyncResult {
        let now = now_millis();
        let mut store = self.lock_store();
        self.reconciler.reconcile_products(&mut *store, rows, now)
    }

    async fn record(
        &self,
        summary: &mut PlatformSummary,
        source: &str,
        outcome: Result<SyncResult, SyncError>,
        deferred: &mut Vec<PendingWrite>,
    ) {
        match outcome {
            Ok(result) => {
                tracing::info!(
                    platform = %summary.platform,
                    source,
                    fetched = result.fetched,
                    added = result.added,
                    updated = result.updated,
                    unchanged = result.unchanged,
                    errors = result.errors.len(),
                    "Source reconciled"
                );
                for failure in &result.errors {
                    tracing::debug!(platform = %summary.platform, source, "{}", failure);
                }
                summary.absorb(source, &result);
            }
            Err(e) => {
                tracing::warn!(platform = %summary.platform, source, error = %e, "Source failed");
                summary.source_failed(source, &e);
            }
        }

        self.persist(summary, source, deferred).await;
    }

    /// Retry the writes earlier runs could not mirror, reporting what still
    /// fails as one summary line.
    async fn retry_backlog(
        &self,
        summary: &mut PlatformSummary,
        deferred: &mut Vec<PendingWrite>,
    ) {
        let Some(pool) = &self.pool else {
            return;
        };

        let backlog = self.lock_store().take_pending_for(&summary.platform);
        if backlog.is_empty() {
            return;
        }

        let total = backlog.len();
        let failed = db::flush_writes(pool, backlog).await;
        let Some((first, reason)) = failed.first() else {
            tracing::info!(platform = %summary.platform, written = total, "Backlog persisted");
            return;
        };

        summary.errors.push(format!(
            "{BACKLOG_SOURCE}: {} of {} queued writes not persisted, first: {}",
            failed.len(),
            total,
            persistence_error(first, reason)
        ));
        deferred.extend(failed.into_iter().map(|(write, _)| write));
    }

    /// Mirror the writes the source just produced. Failed ones are held in
    /// `deferred` and reported under the source.
    ///
    /// Without a pool the memory store is the only copy and the queue is dropped.
    async fn persist(
        &self,
        summary: &mut PlatformSummary,
        source: &str,
        deferred: &mut Vec<PendingWrite>,
    ) {
        let Some(pool) = &self.pool else {
            self.lock_store().clear_pending();
            return;
        };

        let writes = self.lock_store().take_pending_for(&summary.platform);
        if writes.is_empty() {
            return;
        }

        let total = writes.len();
        let failed = db::flush_writes(pool, writes).await;
        if failed.is_empty() {
            tracing::debug!(
                platform = %summary.platform,
                source,
                written = total,
                "Writes persisted"
            );
            return;
        }

        for (write, reason) in failed {
            summary
                .errors
                .push(format!("{source}: {}", persistence_error(&write, &reason)));
            deferred.push(write);
        }
    }

    /// Put held-back writes back on the store queue, one per record.
    fn requeue(&self, deferred: Vec<PendingWrite>) {
        if deferred.is_empty() {
            return;
        }
        let mut store = self.lock_store();
        store.requeue(deferred);
        tracing::warn!(pending = store.pending_count(), "Writes queued for the next run");
    }

    fn finish(
        &self,
        run_id: Uuid,
        started_at: DateTime<Utc>,
        platforms: Vec<PlatformSummary>,
        remember: bool,
    ) -> SyncReport {
        if remember {
            for summary in &platforms {
                self.last_summaries
                    .insert(summary.platform.clone(), summary.clone());
            }
        }

        let report = SyncReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            platforms,
        };
        tracing::info!(
            run_id = %report.run_id,
            platforms = report.platforms.len(),
            errors = report.platforms.iter().map(|p| p.errors.len()).sum::<usize>(),
            "Sync run finished"
        );
        report
    }

    fn lock_store(&self) -> MutexGuard<'_, MemoryStore> {
        // A panic mid-reconcile leaves at most one half-applied batch behind;
        // the store itself stays consistent per record.
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn persistence_error(write: &PendingWrite, reason: &str) -> marketsync_engine::Error {
    marketsync_engine::Error::Persistence {
        collection: write.record.collection.clone(),
        key: write.record.key.to_string(),
        reason: reason.to_string(),
    }
}

fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketsync_engine::{Error, RecordFailure};

    #[test]
    fn summary_prefixes_errors_with_source() {
        let mut summary = PlatformSummary::new(PlatformId::trendyol());
        let result = SyncResult {
            fetched: 3,
            added: 1,
            updated: 1,
            errors: vec![RecordFailure {
                index: 2,
                key: None,
                error: Error::mapping("order 3", "bad date"),
            }],
            ..SyncResult::default()
        };

        summary.absorb("orders", &result);
        summary.source_failed("claims", &SyncError::SourceUnavailable("HTTP 503".into()));

        assert_eq!(summary.total_fetched, 3);
        assert_eq!(summary.added_count, 1);
        assert_eq!(
            summary.errors,
            vec![
                "orders: record #2: cannot map record order 3: bad date".to_string(),
                "claims: source unavailable: HTTP 503".to_string(),
            ]
        );
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = PlatformSummary::new(PlatformId::trendyol());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["platform"], "trendyol");
        assert_eq!(json["totalFetched"], 0);
        assert_eq!(json["addedCount"], 0);
        assert_eq!(json["updatedCount"], 0);
        assert!(json["errors"].as_array().unwrap().is_empty());
    }
}
