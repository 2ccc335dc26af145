//! Schema-whitelist validation of incoming documents
//!
//! Each kind declares its updatable fields in a static table. Keys outside
//! the table are dropped without error; `target` is never part of it and has
//! its own mutators.

use crate::catalog::tags::parse_tags;
use crate::core::error::ValidationError;
use crate::core::types::{EntityKind, ObjectId};
use crate::storage::{Document, FieldUpdates};
use serde_json::Value;

/// Version of the field tables below, bumped on any change to them
pub const SCHEMA_VERSION: u32 = 1;

/// JSON type a field must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A string
    String,
    /// An array of strings
    StringArray,
}

/// One updatable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as stored
    pub name: &'static str,
    /// Expected type
    pub ty: FieldType,
}

const fn field(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { name, ty }
}

const COMPONENT_FIELDS: &[FieldSpec] = &[
    field("name", FieldType::String),
    field("tags", FieldType::StringArray),
    field("status", FieldType::String),
];

const ASSEMBLY_FIELDS: &[FieldSpec] = &[
    field("name", FieldType::String),
    field("tags", FieldType::StringArray),
    field("status", FieldType::String),
];

const KIT_FIELDS: &[FieldSpec] = &[
    field("name", FieldType::String),
    field("tags", FieldType::StringArray),
    field("status", FieldType::String),
];

/// Field holding the containing entity
pub const TARGET_FIELD: &str = "target";

impl EntityKind {
    /// Fields accepted by a general update of this kind
    pub fn updatable_fields(self) -> &'static [FieldSpec] {
        match self {
            EntityKind::Component => COMPONENT_FIELDS,
            EntityKind::Assembly => ASSEMBLY_FIELDS,
            EntityKind::Kit => KIT_FIELDS,
        }
    }

    /// Whether `field` is accepted by a general update of this kind
    pub fn is_updatable(self, field: &str) -> bool {
        self.updatable_fields().iter().any(|spec| spec.name == field)
    }
}

fn check_type(spec: &FieldSpec, value: &Value) -> Result<(), ValidationError> {
    match spec.ty {
        FieldType::String => {
            let s = value.as_str().ok_or_else(|| ValidationError::WrongType {
                field: spec.name.to_string(),
                expected: "string",
            })?;
            if spec.name == "name" && s.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            Ok(())
        }
        FieldType::StringArray => match parse_tags(value) {
            Ok(_) => Ok(()),
            Err(ValidationError::TagsNotArray) => Err(ValidationError::WrongType {
                field: spec.name.to_string(),
                expected: "array of strings",
            }),
            Err(e) => Err(e),
        },
    }
}

/// Reduce `update` to the whitelisted, type-checked fields of `kind`
///
/// An empty result is not an error; the caller decides what nothing to
/// apply means.
pub fn validate(update: &Value, kind: EntityKind) -> Result<FieldUpdates, ValidationError> {
    let object = update.as_object().ok_or(ValidationError::NotAnObject)?;

    let mut updates = FieldUpdates::new();
    for spec in kind.updatable_fields() {
        if let Some(value) = object.get(spec.name) {
            check_type(spec, value)?;
            updates.set(spec.name, value.clone());
        }
    }
    Ok(updates)
}

/// Validate a creation document: `name` required and non-empty, unknown
/// keys dropped, missing fields defaulted
///
/// Components and assemblies may carry an initial `target`; it is checked
/// for format only.
pub fn validate_new(document: &Value, kind: EntityKind) -> Result<Document, ValidationError> {
    let object = document.as_object().ok_or(ValidationError::NotAnObject)?;
    if !object.contains_key("name") {
        return Err(ValidationError::MissingField("name"));
    }

    let mut fields = validate(document, kind)?.into_inner();
    fields.entry("tags").or_insert_with(|| Value::Array(Vec::new()));
    fields.entry("status").or_insert_with(|| Value::String(String::new()));

    if kind.has_target() {
        let target = match object.get(TARGET_FIELD) {
            None | Some(Value::Null) => ObjectId::ZERO,
            Some(Value::String(s)) => ObjectId::parse_hex(s)?,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: TARGET_FIELD.to_string(),
                    expected: "string",
                })
            }
        };
        fields.insert(TARGET_FIELD.to_string(), Value::String(target.to_hex()));
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_unknown_keys_dropped() {
        let updates = validate(
            &json!({"name": "ram", "colour": "red", "_id": "x"}),
            EntityKind::Component,
        )
        .unwrap();
        assert_eq!(updates.fields().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_target_not_updatable() {
        let updates = validate(
            &json!({"target": "64b7f0c2a1b2c3d4e5f60718"}),
            EntityKind::Component,
        )
        .unwrap();
        assert!(updates.is_empty());
        assert!(!EntityKind::Assembly.is_updatable("target"));
    }

    #[test]
    fn test_empty_name_rejected() {
        for kind in EntityKind::ALL {
            assert_eq!(
                validate(&json!({"name": "", "status": "ok"}), kind),
                Err(ValidationError::EmptyName)
            );
        }
    }

    #[test]
    fn test_type_checks() {
        assert!(matches!(
            validate(&json!({"status": 5}), EntityKind::Kit),
            Err(ValidationError::WrongType { expected: "string", .. })
        ));
        assert!(matches!(
            validate(&json!({"tags": "ram"}), EntityKind::Kit),
            Err(ValidationError::WrongType { expected: "array of strings", .. })
        ));
        assert_eq!(
            validate(&json!({"tags": ["a", null]}), EntityKind::Kit),
            Err(ValidationError::NonStringTag { index: 1 })
        );
    }

    #[test]
    fn test_non_object() {
        assert_eq!(
            validate(&json!(["name"]), EntityKind::Assembly),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_validate_new_defaults() {
        let fields = validate_new(&json!({"name": "ram"}), EntityKind::Component).unwrap();
        assert_eq!(fields.get("tags"), Some(&json!([])));
        assert_eq!(fields.get("status"), Some(&json!("")));
        assert_eq!(fields.get("target"), Some(&json!("000000000000000000000000")));

        let kit = validate_new(&json!({"name": "box", "target": "x"}), EntityKind::Kit).unwrap();
        assert!(kit.get("target").is_none());
    }

    #[test]
    fn test_validate_new_requires_name() {
        assert_eq!(
            validate_new(&json!({"status": "ok"}), EntityKind::Kit),
            Err(ValidationError::MissingField("name"))
        );
        assert!(matches!(
            validate_new(&json!({"name": "ram", "target": "nope"}), EntityKind::Component),
            Err(ValidationError::MalformedId(_))
        ));
    }

    fn any_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("name".to_string()),
            Just("tags".to_string()),
            Just("status".to_string()),
            Just("target".to_string()),
            Just("_id".to_string()),
            "[a-z]{1,8}",
        ]
    }

    fn any_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![
            Just(EntityKind::Component),
            Just(EntityKind::Assembly),
            Just(EntityKind::Kit),
        ]
    }

    proptest! {
        #[test]
        fn prop_output_keys_are_schema_keys(keys in prop::collection::vec(any_key(), 0..6), kind in any_kind()) {
            // Values chosen so every whitelisted key type-checks
            let mut object = serde_json::Map::new();
            for key in &keys {
                let value = if key == "tags" { json!(["t"]) } else { json!("v") };
                object.insert(key.clone(), value);
            }

            let updates = validate(&Value::Object(object.clone()), kind).unwrap();
            for field in updates.fields() {
                prop_assert!(kind.is_updatable(field));
                prop_assert!(object.contains_key(field));
            }
            for key in object.keys() {
                prop_assert_eq!(updates.contains(key), kind.is_updatable(key));
            }
        }
    }
}
