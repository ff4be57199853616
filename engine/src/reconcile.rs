//! Create-or-update reconciliation of source batches against a keyed store.
//!
//! # Algorithm
//!
//! For each item of a batch, in the order supplied:
//!
//! 1. A mapping failure is recorded and skipped
//! 2. The record's natural key is looked up in the store
//! 3. Unknown key: the record is inserted
//! 4. Known key: the stored record is overwritten field by field from the
//!    source and its child collections are merged by child key (matched
//!    children overwritten, new ones appended, local-only ones kept), then
//!    written back
//! 5. A store failure is recorded and the batch continues
//!
//! Each record is fully applied before the next one is looked up, so a key
//! repeated within a batch turns into an insert followed by updates.

use crate::entity::{ChildMerge, Entity};
use crate::store::EntityStore;
use crate::{Error, Mapped, Product, ProductVariant, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// When a matched record is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Always write matched records and count them as updated, even when the
    /// source did not change anything (default)
    #[default]
    AlwaysWrite,
    /// Write only when the merged record differs from the stored one;
    /// identical records are counted as unchanged
    OnChange,
}

/// A single record that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    /// Position of the item in the batch handed to the reconciler
    pub index: usize,
    /// Natural key, when the record got far enough to have one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub error: Error,
}

impl fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "record #{} ({}): {}", self.index, key, self.error),
            None => write!(f, "record #{}: {}", self.index, self.error),
        }
    }
}

/// Outcome of reconciling one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// Source records seen (before grouping)
    pub fetched: usize,
    pub added: usize,
    pub updated: usize,
    /// Matched records skipped under [`WritePolicy::OnChange`]
    pub unchanged: usize,
    pub children_added: usize,
    pub children_updated: usize,
    pub errors: Vec<RecordFailure>,
}

impl SyncResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    fn fail(&mut self, index: usize, key: Option<String>, error: Error) {
        self.errors.push(RecordFailure { index, key, error });
    }
}

enum Outcome {
    Added,
    Updated(ChildMerge),
    Unchanged,
}

/// Applies source batches to an [`EntityStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    policy: WritePolicy,
}

impl Reconciler {
    pub fn new(policy: WritePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Reconcile a batch of mapped records.
    ///
    /// Never fails as a whole: every problem is reported per record in
    /// [`SyncResult::errors`].
    pub fn reconcile<E, S>(
        &self,
        store: &mut S,
        batch: Vec<Mapped<E>>,
        now: Timestamp,
    ) -> SyncResult
    where
        E: Entity,
        S: EntityStore,
    {
        let mut result = SyncResult {
            fetched: batch.len(),
            ..SyncResult::default()
        };

        for (index, item) in batch.into_iter().enumerate() {
            let record = match item {
                Ok(record) => record,
                Err(err) => {
                    result.fail(index, None, err);
                    continue;
                }
            };

            let key = record.natural_key();
            match self.apply_one(store, record, now) {
                Ok(Outcome::Added) => result.added += 1,
                Ok(Outcome::Updated(children)) => {
                    result.updated += 1;
                    result.children_added += children.added;
                    result.children_updated += children.updated;
                }
                Ok(Outcome::Unchanged) => result.unchanged += 1,
                Err(err) => result.fail(index, Some(key.to_string()), err),
            }
        }

        result
    }

    /// Group flat product variant rows into products, then reconcile them.
    ///
    /// Grouping runs over the whole batch before any lookup. `fetched` counts
    /// the variant rows, not the products.
    pub fn reconcile_products<S: EntityStore>(
        &self,
        store: &mut S,
        rows: Vec<Mapped<ProductVariant>>,
        now: Timestamp,
    ) -> SyncResult {
        let fetched = rows.len();
        let products = Product::group(rows);
        let mut result = self.reconcile(store, products, now);
        result.fetched = fetched;
        result
    }

    fn apply_one<E, S>(
        &self,
        store: &mut S,
        record: E,
        now: Timestamp,
    ) -> crate::error::Result<Outcome>
    where
        E: Entity,
        S: EntityStore,
    {
        let key = record.natural_key();

        let Some(mut existing) = store.lookup::<E>(&key)? else {
            store.insert(&record, now)?;
            return Ok(Outcome::Added);
        };

        let before = match self.policy {
            WritePolicy::OnChange => Some(serde_json::to_value(&existing)?),
            WritePolicy::AlwaysWrite => None,
        };

        let children = existing.merge_from(record);

        if let Some(before) = before {
            if serde_json::to_value(&existing)? == before {
                return Ok(Outcome::Unchanged);
            }
        }

        store.update(&existing, now)?;
        Ok(Outcome::Updated(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Brand, MemoryStore, NaturalKey, PlatformId};

    fn brand(name: &str, id: &str) -> Mapped<Brand> {
        Ok(Brand {
            platform: PlatformId::trendyol(),
            name: name.to_string(),
            brand_id: Some(id.to_string()),
        })
    }

    #[test]
    fn inserts_then_updates() {
        let mut store = MemoryStore::new();
        let reconciler = Reconciler::default();

        let first = reconciler.reconcile(
            &mut store,
            vec![brand("Acme", "1"), brand("Beta", "2")],
            1000,
        );
        assert_eq!((first.added, first.updated), (2, 0));

        let second = reconciler.reconcile(&mut store, vec![brand("Acme", "10")], 2000);
        assert_eq!((second.added, second.updated), (0, 1));

        let acme: Brand = store
            .entity(&NaturalKey::new(PlatformId::trendyol(), "Acme"))
            .unwrap()
            .unwrap();
        assert_eq!(acme.brand_id.as_deref(), Some("10"));
    }

    #[test]
    fn repeated_key_in_batch_is_one_row() {
        let mut store = MemoryStore::new();
        let result = Reconciler::default().reconcile(
            &mut store,
            vec![brand("Acme", "1"), brand("Acme", "2")],
            1000,
        );

        assert_eq!((result.added, result.updated), (1, 1));
        assert_eq!(store.len("brands"), 1);
    }

    #[test]
    fn mapping_failures_are_reported_in_place() {
        let mut store = MemoryStore::new();
        let result = Reconciler::default().reconcile(
            &mut store,
            vec![
                brand("Acme", "1"),
                Err(Error::mapping("brand #1", "missing name")),
                brand("Beta", "2"),
            ],
            1000,
        );

        assert_eq!(result.fetched, 3);
        assert_eq!(result.added, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].index, 1);
        assert!(result.errors[0].key.is_none());
    }

    #[test]
    fn on_change_policy_skips_identical_records() {
        let mut store = MemoryStore::new();
        let reconciler = Reconciler::new(WritePolicy::OnChange);

        reconciler.reconcile(&mut store, vec![brand("Acme", "1")], 1000);
        store.clear_pending();

        let rerun = reconciler.reconcile(&mut store, vec![brand("Acme", "1")], 2000);
        assert_eq!((rerun.added, rerun.updated, rerun.unchanged), (0, 0, 1));
        assert_eq!(store.pending_count(), 0);

        let changed = reconciler.reconcile(&mut store, vec![brand("Acme", "2")], 3000);
        assert_eq!(changed.updated, 1);
    }

    #[test]
    fn always_write_counts_updates_on_rerun() {
        let mut store = MemoryStore::new();
        let reconciler = Reconciler::new(WritePolicy::AlwaysWrite);

        reconciler.reconcile(&mut store, vec![brand("Acme", "1")], 1000);
        let rerun = reconciler.reconcile(&mut store, vec![brand("Acme", "1")], 2000);
        assert_eq!((rerun.added, rerun.updated), (0, 1));
    }

    #[test]
    fn failure_display() {
        let failure = RecordFailure {
            index: 2,
            key: Some("trendyol:1003".into()),
            error: Error::Persistence {
                collection: "orders".into(),
                key: "trendyol:1003".into(),
                reason: "disk full".into(),
            },
        };
        assert_eq!(
            failure.to_string(),
            "record #2 (trendyol:1003): cannot persist orders trendyol:1003: disk full"
        );
    }
}
