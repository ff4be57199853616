//! Marketplace clients.
//!
//! A [`PlatformClient`] hides one marketplace's HTTP API behind uniform fetch
//! operations. Each fetch returns the complete, already paginated batch for
//! one source, with every element either mapped to its canonical entity or
//! carrying the reason it could not be. A fetch fails as a whole only when the
//! source itself is unreachable or answers with something that is not a page.

pub mod trendyol;

use crate::error::SyncError;
use async_trait::async_trait;
use marketsync_engine::{
    Brand, Category, Claim, Mapped, Order, PlatformId, ProductVariant, Question, Transaction,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of fetching one source.
pub type Fetched<T> = Result<Vec<Mapped<T>>, SyncError>;

/// Read access to one marketplace.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn platform(&self) -> &PlatformId;

    async fn fetch_orders(&self) -> Fetched<Order>;

    /// Flat variant rows; grouping into products happens during reconciliation.
    async fn fetch_products(&self) -> Fetched<ProductVariant>;

    async fn fetch_claims(&self) -> Fetched<Claim>;

    async fn fetch_transactions(&self) -> Fetched<Transaction>;

    async fn fetch_questions(&self) -> Fetched<Question>;

    async fn fetch_brands(&self) -> Fetched<Brand> {
        Ok(Vec::new())
    }

    /// The category tree, flattened parents first.
    async fn fetch_categories(&self) -> Fetched<Category> {
        Ok(Vec::new())
    }

    /// One category together with its attribute definitions.
    async fn fetch_category_attributes(&self, _category_id: &str) -> Fetched<Category> {
        Ok(Vec::new())
    }
}

/// Registered clients keyed by platform.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    clients: HashMap<PlatformId, Arc<dyn PlatformClient>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client, replacing any earlier one for the same platform.
    pub fn register(&mut self, client: Arc<dyn PlatformClient>) {
        self.clients.insert(client.platform().clone(), client);
    }

    pub fn with(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.register(client);
        self
    }

    /// Look a client up, failing with a configuration error for unknown ids.
    pub fn get(&self, platform: &PlatformId) -> Result<Arc<dyn PlatformClient>, SyncError> {
        self.clients
            .get(platform)
            .cloned()
            .ok_or_else(|| SyncError::unknown_platform(platform))
    }

    /// Registered platform ids in a stable order.
    pub fn platforms(&self) -> Vec<PlatformId> {
        let mut ids: Vec<_> = self.clients.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
