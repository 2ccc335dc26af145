//! Target reference mutations
//!
//! Components and assemblies point at their container through `target`.
//! `ObjectId::ZERO` means "not contained". Existence of the target is not
//! checked here; the graph builder rejects dangling references.

use crate::catalog::validate::TARGET_FIELD;
use crate::catalog::Catalog;
use crate::core::error::{Error, Result, StoreError, ValidationError};
use crate::core::types::{EntityKind, ObjectId};
use crate::storage::{FieldUpdates, Store};
use crate::system::metrics;
use serde_json::Value;
use tracing::debug;

fn require_target(kind: EntityKind) -> Result<()> {
    if kind.has_target() {
        Ok(())
    } else {
        Err(ValidationError::NoTargetField(kind).into())
    }
}

impl<S: Store> Catalog<S> {
    /// Current target of an entity, the zero sentinel when unset
    pub fn get_target(&self, kind: EntityKind, id: ObjectId) -> Result<ObjectId> {
        require_target(kind)?;
        let doc = self.store.fetch_by_id(kind, id)?;
        match doc.get(TARGET_FIELD) {
            None | Some(Value::Null) => Ok(ObjectId::ZERO),
            Some(Value::String(hex)) => ObjectId::parse_hex(hex).map_err(|e| {
                Error::from(StoreError::Corruption(format!("{} {} target: {}", kind, id, e)))
            }),
            Some(other) => Err(StoreError::Corruption(format!(
                "{} {} target is not a string: {}",
                kind, id, other
            ))
            .into()),
        }
    }

    /// Point an entity at `target`, given as 24 hex characters
    pub fn set_target(&self, kind: EntityKind, id: ObjectId, target: &str) -> Result<ObjectId> {
        require_target(kind)?;
        let target = ObjectId::parse_hex(target)?;
        self.write_target(kind, id, target)?;
        metrics::record(|m| m.target_mutations.with_label_values(&["set"]).inc());
        Ok(target)
    }

    /// Reset an entity's target to the zero sentinel
    pub fn unset_target(&self, kind: EntityKind, id: ObjectId) -> Result<()> {
        require_target(kind)?;
        self.write_target(kind, id, ObjectId::ZERO)?;
        metrics::record(|m| m.target_mutations.with_label_values(&["unset"]).inc());
        Ok(())
    }

    fn write_target(&self, kind: EntityKind, id: ObjectId, target: ObjectId) -> Result<()> {
        debug!(%kind, %id, %target, "Writing target");
        let updates = FieldUpdates::single(TARGET_FIELD, Value::String(target.to_hex()));
        self.write(kind, id, &updates, None)?;
        Ok(())
    }
}
