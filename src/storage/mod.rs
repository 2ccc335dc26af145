//! Storage abstraction for the catalog
//!
//! The catalog core only talks to a [`Store`]. Documents are JSON field
//! maps keyed by [`ObjectId`], one collection per [`EntityKind`], each with
//! a store-maintained [`Revision`].

use crate::core::entity::{Entity, Identified};
use crate::core::error::{Result, StoreError};
use crate::core::types::{EntityKind, ObjectId, Revision};
use serde_json::{Map, Value};
use std::sync::Arc;

pub mod mem_store;
pub mod factory;

pub use crate::core::config::WriteMode;
pub use factory::{create_shared_store, create_store, SharedStore};
pub use mem_store::MemStore;

/// Raw document body, without its `_id`
pub type Document = Map<String, Value>;

/// A document as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document id
    pub id: ObjectId,
    /// Revision at the time of the read
    pub revision: Revision,
    /// Field values
    pub fields: Document,
}

impl StoredDocument {
    /// Field value by name
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Decode into a typed entity
    pub fn decode<T: Entity>(&self) -> Result<Identified<T>> {
        let entity: T = serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            StoreError::Corruption(format!("{} {}: {}", T::KIND, self.id, e))
        })?;
        Ok(Identified::new(self.id, entity))
    }
}

/// A validated set of field assignments, merged into a document on write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates(Map<String, Value>);

impl FieldUpdates {
    /// Empty update set
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Single-field update
    pub fn single(field: impl Into<String>, value: Value) -> Self {
        let mut updates = Self::new();
        updates.set(field, value);
        updates
    }

    /// Assign a field
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Value assigned to a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether a field is assigned
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of assigned fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is assigned
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Assigned field names
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Field assignments
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Underlying map
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Persistence seam used by the catalog core
///
/// Implementations own connection management. Every call is a single
/// round-trip; the core composes them into read-modify-write sequences and
/// never retries.
pub trait Store: Send + Sync {
    /// Read one document; `Error::NotFound` when absent
    fn fetch_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<StoredDocument>;

    /// Merge `updates` into a document and return its new revision
    ///
    /// With `expected` set, the write only happens if the stored revision
    /// still equals it, otherwise `Error::Conflict` and nothing changes.
    fn write_fields(
        &self,
        kind: EntityKind,
        id: ObjectId,
        updates: &FieldUpdates,
        expected: Option<Revision>,
    ) -> Result<Revision>;

    /// Every document of a kind, ordered by id
    fn list_all(&self, kind: EntityKind) -> Result<Vec<StoredDocument>>;

    /// Insert a new document under a freshly generated id
    fn insert(&self, kind: EntityKind, document: Document) -> Result<ObjectId>;

    /// Remove a document; `Error::NotFound` when absent
    fn delete_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<()>;

    /// Liveness probe
    fn ping(&self) -> Result<()>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn fetch_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<StoredDocument> {
        (**self).fetch_by_id(kind, id)
    }

    fn write_fields(
        &self,
        kind: EntityKind,
        id: ObjectId,
        updates: &FieldUpdates,
        expected: Option<Revision>,
    ) -> Result<Revision> {
        (**self).write_fields(kind, id, updates, expected)
    }

    fn list_all(&self, kind: EntityKind) -> Result<Vec<StoredDocument>> {
        (**self).list_all(kind)
    }

    fn insert(&self, kind: EntityKind, document: Document) -> Result<ObjectId> {
        (**self).insert(kind, document)
    }

    fn delete_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<()> {
        (**self).delete_by_id(kind, id)
    }

    fn ping(&self) -> Result<()> {
        (**self).ping()
    }
}
