//! Catalog service over a [`Store`]
//!
//! Entity CRUD, tag and target mutations, snapshots and graph building.
//! Every mutation validates its input before touching the store and
//! propagates store errors unchanged. Nothing is retried.

pub mod validate;
pub mod tags;
pub mod target;
pub mod history;

use crate::core::config::{StoreConfig, WriteMode};
use crate::core::entity::{CatalogSnapshot, Entity, Identified};
use crate::core::error::{Error, Result};
use crate::core::types::{EntityKind, ObjectId, Revision};
use crate::graph::{build_graph, Graph};
use crate::storage::{Document, FieldUpdates, Store};
use crate::system::health::HealthStatus;
use crate::system::metrics::{self, Timer};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use validate::{validate, validate_new, FieldSpec, FieldType, SCHEMA_VERSION};

/// Result of a general field update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Fields were written; the document is now at this revision
    Applied(Revision),
    /// No whitelisted field remained, the store was not contacted
    NothingToApply,
}

/// Catalog operations over a store
pub struct Catalog<S: Store> {
    store: S,
    write_mode: WriteMode,
}

impl<S: Store> Catalog<S> {
    /// Catalog with last-write-wins mutations
    pub fn new(store: S) -> Self {
        Self::with_write_mode(store, WriteMode::default())
    }

    /// Catalog with an explicit write mode
    pub fn with_write_mode(store: S, write_mode: WriteMode) -> Self {
        Self { store, write_mode }
    }

    /// Catalog configured from the store section
    pub fn from_config(store: S, config: &StoreConfig) -> Self {
        Self::with_write_mode(store, config.write_mode)
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active write mode
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Create an entity from a JSON document
    pub fn create<T: Entity>(&self, document: &Value) -> Result<Identified<T>> {
        let fields = validate_new(document, T::KIND)?;
        self.insert_validated(fields)
    }

    /// Create several entities; every document is validated before any insert
    pub fn create_many<T: Entity>(&self, documents: &[Value]) -> Result<Vec<Identified<T>>> {
        let validated = documents
            .iter()
            .map(|doc| validate_new(doc, T::KIND))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        validated
            .into_iter()
            .map(|fields| self.insert_validated(fields))
            .collect()
    }

    fn insert_validated<T: Entity>(&self, fields: Document) -> Result<Identified<T>> {
        let entity: T = serde_json::from_value(Value::Object(fields.clone()))?;
        let id = self.store.insert(T::KIND, fields)?;

        history::log_create(T::KIND, id, entity.name());
        metrics::record(|m| m.entities_created.with_label_values(&[T::KIND.as_str()]).inc());
        Ok(Identified::new(id, entity))
    }

    /// Read one entity
    pub fn read<T: Entity>(&self, id: ObjectId) -> Result<Identified<T>> {
        self.store.fetch_by_id(T::KIND, id)?.decode()
    }

    /// Every entity of a kind, ordered by id
    pub fn list<T: Entity>(&self) -> Result<Vec<Identified<T>>> {
        self.store
            .list_all(T::KIND)?
            .iter()
            .map(|doc| doc.decode())
            .collect()
    }

    /// Apply the whitelisted fields of `update` to an entity
    pub fn update(&self, kind: EntityKind, id: ObjectId, update: &Value) -> Result<UpdateOutcome> {
        let updates = validate(update, kind)?;
        if updates.is_empty() {
            debug!(%kind, %id, "Update has nothing to apply");
            metrics::record(|m| m.nothing_to_apply.inc());
            return Ok(UpdateOutcome::NothingToApply);
        }

        let revision = self.write(kind, id, &updates, None)?;
        metrics::record(|m| m.entities_updated.with_label_values(&[kind.as_str()]).inc());
        Ok(UpdateOutcome::Applied(revision))
    }

    /// Delete an entity; entities targeting it keep their now dangling target
    pub fn delete(&self, kind: EntityKind, id: ObjectId) -> Result<()> {
        self.store.delete_by_id(kind, id)?;
        history::log_delete(kind, id);
        metrics::record(|m| m.entities_deleted.with_label_values(&[kind.as_str()]).inc());
        Ok(())
    }

    /// Ping the store and report
    pub fn healthcheck(&self) -> HealthStatus {
        let ping_store = match self.store.ping() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Store ping failed");
                false
            }
        };
        HealthStatus::from_ping(ping_store)
    }

    /// All three collections
    pub fn snapshot(&self) -> Result<CatalogSnapshot> {
        Ok(CatalogSnapshot {
            components: self.list()?,
            assemblies: self.list()?,
            kits: self.list()?,
        })
    }

    /// Relationship graph of the whole catalog
    pub fn graph(&self) -> Result<Graph> {
        let snapshot = self.snapshot()?;
        let timer = metrics::Metrics::global().map(|m| Timer::start(m.graph_build_duration.clone()));

        let graph = build_graph(&snapshot.components, &snapshot.assemblies, &snapshot.kits)?;

        if let Some(timer) = timer {
            timer.finish();
        }
        metrics::record(|m| m.graphs_built.inc());
        info!(nodes = graph.node_count(), edges = graph.edge_count(), "Built relationship graph");
        Ok(graph)
    }

    // Writes following a read carry the read revision in compare-and-swap mode.
    pub(crate) fn write_after_read(
        &self,
        kind: EntityKind,
        id: ObjectId,
        updates: &FieldUpdates,
        read: Revision,
    ) -> Result<Revision> {
        let expected = match self.write_mode {
            WriteMode::LastWriteWins => None,
            WriteMode::CompareAndSwap => Some(read),
        };
        self.write(kind, id, updates, expected)
    }

    pub(crate) fn write(
        &self,
        kind: EntityKind,
        id: ObjectId,
        updates: &FieldUpdates,
        expected: Option<Revision>,
    ) -> Result<Revision> {
        match self.store.write_fields(kind, id, updates, expected) {
            Err(Error::Conflict(msg)) => {
                warn!(%kind, %id, "Write conflict: {}", msg);
                metrics::record(|m| m.write_conflicts.inc());
                Err(Error::Conflict(msg))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::{Assembly, Component, Kit};
    use crate::core::error::{GraphError, StoreError, ValidationError};
    use crate::storage::{MemStore, StoredDocument};
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_create_read_list() {
        let catalog = Catalog::new(MemStore::new());
        let created = catalog
            .create::<Component>(&json!({"name": "ram", "tags": ["8gb"], "colour": "green"}))
            .unwrap();
        assert_eq!(created.entity.name, "ram");

        let read = catalog.read::<Component>(created.id).unwrap();
        assert_eq!(read, created);

        let listed = catalog.list::<Component>().unwrap();
        assert_eq!(listed, vec![created]);
        assert!(catalog.list::<Kit>().unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let catalog = Catalog::new(MemStore::new());
        let err = catalog.create::<Kit>(&json!({"name": ""})).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyName)));
        assert_eq!(catalog.store().document_count(), 0);
    }

    #[test]
    fn test_create_many_is_validated_up_front() {
        let catalog = Catalog::new(MemStore::new());
        let err = catalog
            .create_many::<Assembly>(&[json!({"name": "psu"}), json!({"name": ""})])
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyName)));
        assert_eq!(catalog.store().document_count(), 0);

        let created = catalog
            .create_many::<Assembly>(&[json!({"name": "psu"}), json!({"name": "fan"})])
            .unwrap();
        assert_eq!(created.len(), 2);
    }

    #[test]
    fn test_update_merges_whitelisted_fields() {
        let catalog = Catalog::new(MemStore::new());
        let kit = catalog
            .create::<Kit>(&json!({"name": "box", "status": "new"}))
            .unwrap();

        let outcome = catalog
            .update(EntityKind::Kit, kit.id, &json!({"status": "packed", "weight": 4}))
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Applied(_)));

        let read = catalog.read::<Kit>(kit.id).unwrap();
        assert_eq!(read.entity.name, "box");
        assert_eq!(read.entity.status, "packed");
    }

    #[test]
    fn test_update_nothing_to_apply_skips_store() {
        let catalog = Catalog::new(MemStore::new());
        catalog.store().set_available(false);

        let outcome = catalog
            .update(EntityKind::Component, ObjectId::generate(), &json!({"colour": "red"}))
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NothingToApply);
    }

    #[test]
    fn test_update_cannot_move_target() {
        let catalog = Catalog::new(MemStore::new());
        let component = catalog.create::<Component>(&json!({"name": "ram"})).unwrap();
        let outcome = catalog
            .update(
                EntityKind::Component,
                component.id,
                &json!({"target": "64b7f0c2a1b2c3d4e5f60799"}),
            )
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NothingToApply);
        assert!(catalog.read::<Component>(component.id).unwrap().entity.target.is_zero());
    }

    #[test]
    fn test_store_errors_propagate() {
        let catalog = Catalog::new(MemStore::new());
        let kit = catalog.create::<Kit>(&json!({"name": "box"})).unwrap();
        catalog.store().set_available(false);

        let err = catalog
            .update(EntityKind::Kit, kit.id, &json!({"name": "crate"}))
            .unwrap_err();
        assert!(matches!(err, Error::Store(StoreError::Unavailable(_))));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_delete_leaves_dangling_children() {
        let catalog = Catalog::new(MemStore::new());
        let kit = catalog.create::<Kit>(&json!({"name": "box"})).unwrap();
        catalog
            .create::<Component>(&json!({"name": "ram", "target": kit.id.to_hex()}))
            .unwrap();

        catalog.delete(EntityKind::Kit, kit.id).unwrap();
        assert!(matches!(catalog.read::<Kit>(kit.id), Err(Error::NotFound(_))));
        assert!(matches!(
            catalog.graph(),
            Err(Error::Graph(GraphError::DanglingTarget { .. }))
        ));
    }

    #[test]
    fn test_healthcheck() {
        let catalog = Catalog::new(MemStore::new());
        assert!(catalog.healthcheck().is_healthy());

        catalog.store().set_available(false);
        let status = catalog.healthcheck();
        assert!(!status.ping_store);
        assert!(!status.is_healthy());
    }

    #[test]
    fn test_snapshot_and_graph() {
        let catalog = Catalog::new(MemStore::new());
        let kit = catalog.create::<Kit>(&json!({"name": "desktop"})).unwrap();
        catalog
            .create::<Component>(&json!({"name": "ram", "target": kit.id.to_hex()}))
            .unwrap();
        catalog.create::<Component>(&json!({"name": "spare"})).unwrap();

        let snapshot = catalog.snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);

        let graph = catalog.graph().unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
    }

    type Hook = Box<dyn FnOnce(&MemStore) + Send>;

    /// Runs a competing write right after the first read
    struct Interleaving {
        inner: MemStore,
        hook: Mutex<Option<Hook>>,
    }

    impl Interleaving {
        fn new(inner: MemStore, hook: Hook) -> Self {
            Self {
                inner,
                hook: Mutex::new(Some(hook)),
            }
        }
    }

    impl Store for Interleaving {
        fn fetch_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<StoredDocument> {
            let doc = self.inner.fetch_by_id(kind, id)?;
            if let Some(hook) = self.hook.lock().unwrap().take() {
                hook(&self.inner);
            }
            Ok(doc)
        }

        fn write_fields(
            &self,
            kind: EntityKind,
            id: ObjectId,
            updates: &FieldUpdates,
            expected: Option<Revision>,
        ) -> Result<Revision> {
            self.inner.write_fields(kind, id, updates, expected)
        }

        fn list_all(&self, kind: EntityKind) -> Result<Vec<StoredDocument>> {
            self.inner.list_all(kind)
        }

        fn insert(&self, kind: EntityKind, document: Document) -> Result<ObjectId> {
            self.inner.insert(kind, document)
        }

        fn delete_by_id(&self, kind: EntityKind, id: ObjectId) -> Result<()> {
            self.inner.delete_by_id(kind, id)
        }

        fn ping(&self) -> Result<()> {
            self.inner.ping()
        }
    }

    fn racing_catalog(mode: WriteMode) -> (Catalog<Interleaving>, ObjectId) {
        let inner = MemStore::new();
        let id = inner
            .insert(
                EntityKind::Component,
                json!({"name": "ram", "tags": ["a"]}).as_object().cloned().unwrap(),
            )
            .unwrap();

        let hook: Hook = Box::new(move |store: &MemStore| {
            let updates = FieldUpdates::single("tags", json!(["a", "b"]));
            store
                .write_fields(EntityKind::Component, id, &updates, None)
                .unwrap();
        });
        (Catalog::with_write_mode(Interleaving::new(inner, hook), mode), id)
    }

    #[test]
    fn test_last_write_wins_loses_concurrent_tag() {
        let (catalog, id) = racing_catalog(WriteMode::LastWriteWins);
        let tags = catalog
            .add_tags(EntityKind::Component, id, &json!(["c"]))
            .unwrap();
        assert_eq!(tags, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(catalog.get_tags(EntityKind::Component, id).unwrap(), tags);
    }

    #[test]
    fn test_compare_and_swap_reports_conflict() {
        let (catalog, id) = racing_catalog(WriteMode::CompareAndSwap);
        let err = catalog
            .add_tags(EntityKind::Component, id, &json!(["c"]))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(
            catalog.get_tags(EntityKind::Component, id).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
