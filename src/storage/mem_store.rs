//! In-memory store using DashMap
//!
//! One concurrent map per collection. Revision checks and field merges run
//! while holding the entry's shard lock, so a compare-and-swap write is
//! atomic with respect to other writers on the same document.

use crate::core::entity::CatalogSnapshot;
use crate::core::error::{Error, Result, StoreError};
use crate::core::types::{EntityKind, ObjectId, Revision};
use crate::storage::{Document, FieldUpdates, Store, StoredDocument};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Clone)]
struct Record {
    revision: Revision,
    fields: Document,
}

/// DashMap-backed [`Store`]
#[derive(Debug)]
pub struct MemStore {
    components: DashMap<ObjectId, Record>,
    assemblies: DashMap<ObjectId, Record>,
    kits: DashMap<ObjectId, Record>,

    /// Cleared to simulate an unreachable backend
    available: AtomicBool,
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            components: DashMap::new(),
            assemblies: DashMap::new(),
            kits: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Create a store holding every entity of a snapshot, ids preserved
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Result<Self> {
        let store = Self::new();
        for component in &snapshot.components {
            store.insert_with_id(EntityKind::Component, component.id, to_document(&component.entity)?)?;
        }
        for assembly in &snapshot.assemblies {
            store.insert_with_id(EntityKind::Assembly, assembly.id, to_document(&assembly.entity)?)?;
        }
        for kit in &snapshot.kits {
            store.insert_with_id(EntityKind::Kit, kit.id, to_document(&kit.entity)?)?;
        }
        debug!(documents = store.document_count(), "Seeded store from snapshot");
        Ok(store)
    }

    /// Insert a document under a caller-chosen id
    pub fn insert_with_id(&self, kind: EntityKind, id: ObjectId, mut document: Document) -> Result<()> {
        self.check_available()?;
        document.remove("_id");

        // Ids are unique across collections. Other collections are checked
        // before taking this one's entry lock so no two shard locks are held.
        if EntityKind::ALL
            .iter()
            .any(|other| *other != kind && self.collection(*other).contains_key(&id))
        {
            return Err(StoreError::DuplicateId(id).into());
        }

        let collection = self.collection(kind);
        match collection.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::DuplicateId(id).into()),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Record {
                    revision: Revision::INITIAL,
                    fields: document,
                });
                Ok(())
            }
        }
    }

    /// Number of documents in one collection
    pub fn len(&self, kind: EntityKind) -> usize {
        self.collection(kind).len()
    }

    /// Number of documents across all collections
    pub fn document_count(&self) -> usize {
        EntityKind::ALL.iter().map(|kind| self.len(*kind)).sum()
    }

    /// Toggle availability; while unavailable every call fails
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn collection(&self, kind: EntityKind) -> &DashMap<ObjectId, Record> {
        match kind {
            EntityKind::Component => &self.components,
            EntityKind::Assembly => &self.assemblies,
            EntityKind::Kit => &self.kits,
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()).into())
        }
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

fn to_document<T: Serialize>(entity: &T) -> Result<Document> {
    match serde_json::to_value(entity)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Corruption(format!("entity serialized to non-object: {}", other)).into()),
    }
}

impl Store for MemStore {
    fn fetch_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<StoredDocument> {
        self.check_available()?;
        let record = self
            .collection(kind)
            .get(&id)
            .ok_or_else(|| Error::not_found(kind, id))?;

        Ok(StoredDocument {
            id,
            revision: record.revision,
            fields: record.fields.clone(),
        })
    }

    fn write_fields(
        &self,
        kind: EntityKind,
        id: ObjectId,
        updates: &FieldUpdates,
        expected: Option<Revision>,
    ) -> Result<Revision> {
        self.check_available()?;
        let mut record = self
            .collection(kind)
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(kind, id))?;

        if let Some(expected) = expected {
            if record.revision != expected {
                debug!(%kind, %id, %expected, current = %record.revision, "Stale write rejected");
                return Err(Error::conflict(kind, id));
            }
        }

        for (field, value) in updates.iter() {
            record.fields.insert(field.clone(), value.clone());
        }
        record.revision = record.revision.next();
        Ok(record.revision)
    }

    fn list_all(&self, kind: EntityKind) -> Result<Vec<StoredDocument>> {
        self.check_available()?;
        let mut documents: Vec<StoredDocument> = self
            .collection(kind)
            .iter()
            .map(|entry| StoredDocument {
                id: *entry.key(),
                revision: entry.revision,
                fields: entry.fields.clone(),
            })
            .collect();
        documents.sort_by_key(|doc| doc.id);
        Ok(documents)
    }

    fn insert(&self, kind: EntityKind, document: Document) -> Result<ObjectId> {
        let id = ObjectId::generate();
        self.insert_with_id(kind, id, document)?;
        Ok(id)
    }

    fn delete_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<()> {
        self.check_available()?;
        self.collection(kind)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(kind, id))
    }

    fn ping(&self) -> Result<()> {
        self.check_available()
    }
}
