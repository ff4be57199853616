//! Status handler - last run per platform and store counters.

use crate::scheduler::SchedulerState;
use crate::sync::{PlatformSummary, SyncService};
use marketsync_engine::Entity;
use serde::Serialize;
use std::collections::BTreeMap;

/// Response for the status endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub scheduler: SchedulerState,
    /// Registered platform ids
    pub platforms: Vec<String>,
    /// Last regular-run summary per platform
    pub last_runs: Vec<PlatformSummary>,
    /// Stored entities per collection
    pub stored: BTreeMap<&'static str, usize>,
    /// Writes not yet mirrored to the database
    pub pending_writes: usize,
}

const COLLECTIONS: [&str; 7] = [
    marketsync_engine::Order::COLLECTION,
    marketsync_engine::Product::COLLECTION,
    marketsync_engine::Claim::COLLECTION,
    marketsync_engine::Transaction::COLLECTION,
    marketsync_engine::Question::COLLECTION,
    marketsync_engine::Brand::COLLECTION,
    marketsync_engine::Category::COLLECTION,
];

/// Collect the current sync status.
pub fn handle_status(service: &SyncService, scheduler: SchedulerState) -> StatusResponse {
    let (stored, pending_writes) = {
        let store = service.store();
        let store = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let stored: BTreeMap<&'static str, usize> = COLLECTIONS
            .iter()
            .map(|&collection| (collection, store.len(collection)))
            .collect();
        (stored, store.pending_count())
    };

    StatusResponse {
        scheduler,
        platforms: service
            .registry()
            .platforms()
            .iter()
            .map(ToString::to_string)
            .collect(),
        last_runs: service.last_summaries(),
        stored,
        pending_writes,
    }
}
