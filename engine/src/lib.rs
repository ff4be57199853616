//! # Marketsync Engine
//!
//! A deterministic reconciliation engine for marketplace data.
//!
//! This crate turns batches of canonical marketplace records (orders,
//! products, claims, transactions, questions, categories, brands) into
//! idempotent create-or-update writes against a keyed store.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine knows nothing about HTTP, databases or schedules
//! - **Deterministic**: records are applied strictly in the order supplied
//! - **Idempotent**: applying the same batch twice leaves the same stored state
//! - **Isolated failures**: one bad record never aborts its batch
//!
//! ## Core Concepts
//!
//! ### Entities and natural keys
//!
//! Every header type implements [`Entity`]: it names its collection and
//! exposes a [`NaturalKey`] made of the source identifier and its
//! [`PlatformId`]. Nested rows implement [`ChildEntity`] with a key that is
//! unique within the parent.
//!
//! ### Normalization
//!
//! The [`normalize`] module maps source vocabularies (statuses, epoch
//! milliseconds, numeric strings) onto canonical values. Platform clients
//! call it while mapping wire payloads, producing [`Mapped`] items.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] applies a batch to any [`EntityStore`]:
//! unknown keys are inserted, known keys are overwritten and their children
//! merged. Local-only children are never removed.
//!
//! ## Quick Start
//!
//! ```rust
//! use marketsync_engine::{Brand, MemoryStore, PlatformId, Reconciler};
//!
//! let mut store = MemoryStore::new();
//! let batch = vec![Ok(Brand {
//!     platform: PlatformId::trendyol(),
//!     name: "Acme".to_string(),
//!     brand_id: Some("42".to_string()),
//! })];
//!
//! let result = Reconciler::default().reconcile(&mut store, batch.clone(), 1706745600000);
//! assert_eq!(result.added, 1);
//!
//! let again = Reconciler::default().reconcile(&mut store, batch, 1706745660000);
//! assert_eq!(again.added, 0);
//! assert_eq!(store.len("brands"), 1);
//! ```

pub mod entity;
pub mod error;
pub mod model;
pub mod normalize;
pub mod platform;
pub mod reconcile;
pub mod record;
pub mod store;

// Re-export main types at crate root
pub use entity::{merge_children, ChildEntity, ChildMerge, Entity};
pub use error::Error;
pub use model::{
    AttributeValue, Brand, Category, CategoryAttribute, Claim, ClaimItem, ClaimLineGroup, Order,
    OrderLine, Product, ProductAttribute, ProductVariant, ProductVariantDetail, Question,
    Transaction,
};
pub use normalize::{ClaimStatus, OrderStatus, QuestionStatus};
pub use platform::{NaturalKey, PlatformId};
pub use reconcile::{RecordFailure, Reconciler, SyncResult, WritePolicy};
pub use record::{Metadata, Record};
pub use store::{Collection, EntityStore, MemoryStore, PendingWrite, WriteKind};

/// A source record after mapping: the canonical value, or why it could not be built.
pub type Mapped<T> = std::result::Result<T, Error>;

/// Type aliases for clarity
pub type CollectionName = String;
pub type Version = u64;
pub type Timestamp = u64;
