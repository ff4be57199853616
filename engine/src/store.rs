//! Keyed entity storage.
//!
//! The reconciler only needs three operations from a store: look a record up
//! by natural key, insert a new one, and update an existing one. That contract
//! is [`EntityStore`]. [`MemoryStore`] is the in-process implementation; it
//! also keeps every write in a pending queue so a caller can mirror the
//! changes into durable storage and acknowledge them afterwards.

use crate::{
    error::Result, CollectionName, Entity, Error, NaturalKey, PlatformId, Record, Timestamp,
    Version,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lookup/insert/update access to persisted entities.
pub trait EntityStore {
    /// Find the stored entity with this natural key.
    fn lookup<E: Entity>(&self, key: &NaturalKey) -> Result<Option<E>>;

    /// Persist a new entity. Fails if the key is already taken.
    fn insert<E: Entity>(&mut self, entity: &E, timestamp: Timestamp) -> Result<()>;

    /// Overwrite an existing entity. Fails if the key is unknown.
    fn update<E: Entity>(&mut self, entity: &E, timestamp: Timestamp) -> Result<()>;
}

/// A collection of records keyed by natural key.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: HashMap<NaturalKey, Record>,
}

impl Collection {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    pub fn get(&self, key: &NaturalKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &NaturalKey) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    pub fn insert(&mut self, record: Record) {
        self.records.insert(record.key.clone(), record);
    }

    pub fn contains(&self, key: &NaturalKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Kind of write waiting to be mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteKind {
    Insert,
    Update,
}

/// A write that has been applied in memory but not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWrite {
    pub kind: WriteKind,
    /// The record as it was right after the write
    pub record: Record,
}

impl PendingWrite {
    pub fn version(&self) -> Version {
        self.record.version
    }
}

/// In-memory [`EntityStore`] with a pending-write queue.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<CollectionName, Collection>,
    pending_writes: Vec<PendingWrite>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load already-durable records (e.g. at startup). Nothing is queued.
    pub fn import(&mut self, records: impl IntoIterator<Item = Record>) -> usize {
        let mut count = 0;
        for record in records {
            self.collections
                .entry(record.collection.clone())
                .or_default()
                .insert(record);
            count += 1;
        }
        count
    }

    /// Get a stored record envelope.
    pub fn get(&self, collection: &str, key: &NaturalKey) -> Option<&Record> {
        self.collections.get(collection).and_then(|c| c.get(key))
    }

    /// Get a collection by name.
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Number of records in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Collection::len)
    }

    /// Whether the store holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.collections.values().all(Collection::is_empty)
    }

    /// Decode one stored entity.
    pub fn entity<E: Entity>(&self, key: &NaturalKey) -> Result<Option<E>> {
        self.lookup(key)
    }

    /// Decode every entity of a type, ordered by natural key.
    pub fn entities<E: Entity>(&self) -> Result<Vec<E>> {
        let Some(collection) = self.collections.get(E::COLLECTION) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<&Record> = collection.records().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));

        records
            .into_iter()
            .map(|r| serde_json::from_value(r.payload.clone()).map_err(Error::from))
            .collect()
    }

    /// Writes not yet acknowledged, oldest first.
    pub fn pending_writes(&self) -> &[PendingWrite] {
        &self.pending_writes
    }

    pub fn pending_count(&self) -> usize {
        self.pending_writes.len()
    }

    /// Remove and return all pending writes.
    pub fn take_pending(&mut self) -> Vec<PendingWrite> {
        std::mem::take(&mut self.pending_writes)
    }

    /// Remove and return the pending writes of one platform, oldest first.
    pub fn take_pending_for(&mut self, platform: &PlatformId) -> Vec<PendingWrite> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_writes)
            .into_iter()
            .partition(|w| &w.record.key.platform == platform);
        self.pending_writes = kept;
        taken
    }

    /// Put writes that could not be mirrored back in front of the queue.
    ///
    /// The queue then holds at most one write per collection and key: the
    /// one with the highest version, at the position of the first write
    /// for that record. Every write carries the full record, so the older
    /// ones add nothing.
    pub fn requeue(&mut self, mut writes: Vec<PendingWrite>) {
        writes.append(&mut self.pending_writes);

        let mut slots: HashMap<(CollectionName, NaturalKey), usize> = HashMap::new();
        let mut queue: Vec<PendingWrite> = Vec::with_capacity(writes.len());
        for write in writes {
            let slot = (write.record.collection.clone(), write.record.key.clone());
            match slots.get(&slot) {
                Some(&at) => {
                    if write.version() >= queue[at].version() {
                        queue[at] = write;
                    }
                }
                None => {
                    slots.insert(slot, queue.len());
                    queue.push(write);
                }
            }
        }
        self.pending_writes = queue;
    }

    pub fn clear_pending(&mut self) {
        self.pending_writes.clear();
    }

    fn validate_key(key: &NaturalKey) -> Result<()> {
        if key.value.trim().is_empty() || key.platform.as_str().is_empty() {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl EntityStore for MemoryStore {
    fn lookup<E: Entity>(&self, key: &NaturalKey) -> Result<Option<E>> {
        match self.get(E::COLLECTION, key) {
            Some(record) => Ok(Some(serde_json::from_value(record.payload.clone())?)),
            None => Ok(None),
        }
    }

    fn insert<E: Entity>(&mut self, entity: &E, timestamp: Timestamp) -> Result<()> {
        let key = entity.natural_key();
        Self::validate_key(&key)?;

        let collection = self.collections.entry(E::COLLECTION.to_string()).or_default();
        if collection.contains(&key) {
            return Err(Error::RecordAlreadyExists {
                collection: E::COLLECTION.to_string(),
                key,
            });
        }

        let payload = serde_json::to_value(entity)?;
        let record = Record::new(key, E::COLLECTION, payload, timestamp);
        collection.insert(record.clone());

        self.pending_writes.push(PendingWrite {
            kind: WriteKind::Insert,
            record,
        });
        Ok(())
    }

    fn update<E: Entity>(&mut self, entity: &E, timestamp: Timestamp) -> Result<()> {
        let key = entity.natural_key();
        let payload = serde_json::to_value(entity)?;

        let record = self
            .collections
            .get_mut(E::COLLECTION)
            .and_then(|c| c.get_mut(&key))
            .ok_or_else(|| Error::RecordNotFound {
                collection: E::COLLECTION.to_string(),
                key: key.clone(),
            })?;

        record.update_payload(payload, timestamp);
        let record = record.clone();

        self.pending_writes.push(PendingWrite {
            kind: WriteKind::Update,
            record,
        });
        Ok(())
    }
}
