//! The contract every reconcilable record type implements.
//!
//! Headers ([`Entity`]) are identified by a platform-qualified [`NaturalKey`]
//! and live in a named collection. Children ([`ChildEntity`]) are identified
//! by a key that is only unique within their parent and are merged by
//! [`merge_children`].

use crate::{NaturalKey, PlatformId};
use serde::{de::DeserializeOwned, Serialize};

/// A top-level canonical record.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Collection the record is stored in.
    const COLLECTION: &'static str;

    /// Platform the record came from.
    fn platform(&self) -> &PlatformId;

    /// Source identifier, unique within [`Entity::platform`].
    fn key_value(&self) -> String;

    /// Platform-qualified natural key.
    fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.platform().clone(), self.key_value())
    }

    /// Overwrite this (stored) record with `incoming`.
    ///
    /// Scalars are replaced unconditionally; child collections are merged with
    /// [`merge_children`], so children missing from `incoming` survive.
    fn merge_from(&mut self, incoming: Self) -> ChildMerge;
}

/// A record nested inside a parent entity.
pub trait ChildEntity: Clone {
    /// Identifier unique within the parent.
    fn child_key(&self) -> String;

    /// Overwrite this child with `incoming`, merging any nested children.
    ///
    /// The default replaces the child wholesale, which is correct for leaves.
    fn merge_from(&mut self, incoming: Self) -> ChildMerge {
        *self = incoming;
        ChildMerge::default()
    }
}

/// Counts of child rows touched by a merge, summed over every nesting level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildMerge {
    pub added: usize,
    pub updated: usize,
}

impl ChildMerge {
    pub fn absorb(&mut self, other: ChildMerge) {
        self.added += other.added;
        self.updated += other.updated;
    }
}

/// Merge `incoming` children into `existing` by child key.
///
/// Matched children are overwritten in place, unmatched ones are appended in
/// incoming order, and children only present in `existing` are kept.
pub fn merge_children<C: ChildEntity>(existing: &mut Vec<C>, incoming: Vec<C>) -> ChildMerge {
    let mut stats = ChildMerge::default();

    for child in incoming {
        let key = child.child_key();
        match existing.iter_mut().find(|c| c.child_key() == key) {
            Some(current) => {
                let nested = current.merge_from(child);
                stats.updated += 1;
                stats.absorb(nested);
            }
            None => {
                existing.push(child);
                stats.added += 1;
            }
        }
    }

    stats
}
