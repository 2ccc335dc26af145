//! Tag set mutations
//!
//! Tags are an ordered list of exact-match strings. Adding never reorders
//! existing tags and never introduces a duplicate; removing keeps the order
//! of what remains.

use crate::catalog::Catalog;
use crate::core::error::{Error, Result, StoreError, ValidationError};
use crate::core::types::{EntityKind, ObjectId};
use crate::storage::{FieldUpdates, Store, StoredDocument};
use crate::system::metrics;
use serde_json::Value;
use tracing::debug;

/// Field holding the tags in a stored document
pub const TAGS_FIELD: &str = "tags";

/// Parse a JSON payload that must be an array of strings
pub fn parse_tags(payload: &Value) -> std::result::Result<Vec<String>, ValidationError> {
    let items = payload.as_array().ok_or(ValidationError::TagsNotArray)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_owned)
                .ok_or(ValidationError::NonStringTag { index })
        })
        .collect()
}

/// `current` followed by every tag of `new` not already present, in input order
pub fn add_tags(current: &[String], new: &[String]) -> Vec<String> {
    let mut result = current.to_vec();
    for tag in new {
        if !result.contains(tag) {
            result.push(tag.clone());
        }
    }
    result
}

/// Every tag of `current` that appears nowhere in `remove`, order preserved
pub fn remove_tags(current: &[String], remove: &[String]) -> Vec<String> {
    current
        .iter()
        .filter(|tag| !remove.contains(tag))
        .cloned()
        .collect()
}

// A missing or null field reads as no tags.
fn stored_tags(doc: &StoredDocument, kind: EntityKind) -> Result<Vec<String>> {
    match doc.get(TAGS_FIELD) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => parse_tags(value).map_err(|e| {
            Error::from(StoreError::Corruption(format!("{} {} tags: {}", kind, doc.id, e)))
        }),
    }
}

impl<S: Store> Catalog<S> {
    /// Current tags of an entity
    pub fn get_tags(&self, kind: EntityKind, id: ObjectId) -> Result<Vec<String>> {
        let doc = self.store.fetch_by_id(kind, id)?;
        stored_tags(&doc, kind)
    }

    /// Replace the tags of an entity with an empty list
    pub fn clear_tags(&self, kind: EntityKind, id: ObjectId) -> Result<()> {
        let doc = self.store.fetch_by_id(kind, id)?;
        self.write_tags(kind, &doc, Vec::new())?;
        metrics::record(|m| m.tag_mutations.with_label_values(&["clear"]).inc());
        Ok(())
    }

    /// Append the tags of `payload` not already present; returns the new tags
    pub fn add_tags(&self, kind: EntityKind, id: ObjectId, payload: &Value) -> Result<Vec<String>> {
        let incoming = parse_tags(payload)?;
        let doc = self.store.fetch_by_id(kind, id)?;
        let tags = add_tags(&stored_tags(&doc, kind)?, &incoming);
        self.write_tags(kind, &doc, tags.clone())?;
        metrics::record(|m| m.tag_mutations.with_label_values(&["add"]).inc());
        Ok(tags)
    }

    /// Drop every tag listed in `payload`; returns the new tags
    pub fn remove_tags(&self, kind: EntityKind, id: ObjectId, payload: &Value) -> Result<Vec<String>> {
        let outgoing = parse_tags(payload)?;
        let doc = self.store.fetch_by_id(kind, id)?;
        let tags = remove_tags(&stored_tags(&doc, kind)?, &outgoing);
        self.write_tags(kind, &doc, tags.clone())?;
        metrics::record(|m| m.tag_mutations.with_label_values(&["remove"]).inc());
        Ok(tags)
    }

    fn write_tags(&self, kind: EntityKind, read: &StoredDocument, tags: Vec<String>) -> Result<()> {
        debug!(%kind, id = %read.id, count = tags.len(), "Writing tags");
        let updates = FieldUpdates::single(TAGS_FIELD, Value::from(tags));
        self.write_after_read(kind, read.id, &updates, read.revision)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Component;
    use crate::storage::MemStore;
    use proptest::prelude::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn catalog_with_component(tags: &[&str]) -> (Catalog<MemStore>, ObjectId) {
        let catalog = Catalog::new(MemStore::new());
        let created = catalog
            .create::<Component>(&json!({"name": "ram", "tags": tags}))
            .unwrap();
        (catalog, created.id)
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(&json!(["a", "b"])).unwrap(), strings(&["a", "b"]));
        assert_eq!(parse_tags(&json!("a")), Err(ValidationError::TagsNotArray));
        assert_eq!(
            parse_tags(&json!(["a", 3])),
            Err(ValidationError::NonStringTag { index: 1 })
        );
    }

    #[test]
    fn test_add_skips_duplicates_within_one_call() {
        let result = add_tags(&strings(&["ram"]), &strings(&["new", "ram", "new"]));
        assert_eq!(result, strings(&["ram", "new"]));
    }

    #[test]
    fn test_remove_absent_is_not_an_error() {
        let result = remove_tags(&strings(&["ram", "8gb"]), &strings(&["ssd"]));
        assert_eq!(result, strings(&["ram", "8gb"]));
    }

    #[test]
    fn test_remove_then_add_sequence() {
        let (catalog, id) = catalog_with_component(&["ram", "8gb"]);

        let after_remove = catalog
            .remove_tags(EntityKind::Component, id, &json!(["8gb"]))
            .unwrap();
        assert_eq!(after_remove, strings(&["ram"]));

        let after_add = catalog
            .add_tags(EntityKind::Component, id, &json!(["new"]))
            .unwrap();
        assert_eq!(after_add, strings(&["ram", "new"]));
        assert_eq!(catalog.get_tags(EntityKind::Component, id).unwrap(), after_add);
    }

    #[test]
    fn test_clear_tags() {
        let (catalog, id) = catalog_with_component(&["ram", "8gb"]);
        catalog.clear_tags(EntityKind::Component, id).unwrap();
        assert!(catalog.get_tags(EntityKind::Component, id).unwrap().is_empty());
    }

    #[test]
    fn test_bad_payload_rejected_before_store() {
        let (catalog, id) = catalog_with_component(&["ram"]);
        catalog.store().set_available(false);

        // Validation wins over the unreachable store
        let err = catalog
            .add_tags(EntityKind::Component, id, &json!(["ok", false]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NonStringTag { index: 1 })
        ));
    }

    #[test]
    fn test_missing_entity() {
        let catalog = Catalog::new(MemStore::new());
        let err = catalog
            .add_tags(EntityKind::Kit, ObjectId::generate(), &json!(["x"]))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_missing_tags_field_reads_empty() {
        let store = MemStore::new();
        let id = store
            .insert(
                EntityKind::Kit,
                json!({"name": "box", "tags": null}).as_object().cloned().unwrap(),
            )
            .unwrap();
        let catalog = Catalog::new(store);
        assert!(catalog.get_tags(EntityKind::Kit, id).unwrap().is_empty());
        assert_eq!(
            catalog.add_tags(EntityKind::Kit, id, &json!(["a"])).unwrap(),
            strings(&["a"])
        );
    }

    fn tag_list() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-d]{1,2}", 0..8)
    }

    fn unique_tag_list() -> impl Strategy<Value = Vec<String>> {
        tag_list().prop_map(|tags| add_tags(&[], &tags))
    }

    proptest! {
        #[test]
        fn prop_add_is_idempotent(current in tag_list(), new in tag_list()) {
            let once = add_tags(&current, &new);
            prop_assert_eq!(add_tags(&once, &new), once);
        }

        #[test]
        fn prop_add_never_duplicates(current in unique_tag_list(), new in tag_list()) {
            let result = add_tags(&current, &new);
            prop_assert_eq!(add_tags(&[], &result), result.clone());
            prop_assert!(result.starts_with(&current));
        }

        #[test]
        fn prop_remove_after_add(current in tag_list(), new in tag_list()) {
            let expected: Vec<String> = current.iter().filter(|t| !new.contains(t)).cloned().collect();
            prop_assert_eq!(remove_tags(&add_tags(&current, &new), &new), expected);
        }
    }
}
