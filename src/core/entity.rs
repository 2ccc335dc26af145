//! Entity model: components, assemblies and kits
//!
//! All three kinds share a name, tags and a status. Components and
//! assemblies additionally carry a `target` pointing at the entity that
//! contains them, `ObjectId::ZERO` when they are not contained anywhere.

use crate::core::types::{EntityKind, ObjectId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Capability shared by every cataloged entity
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Kind tag of this entity type
    const KIND: EntityKind;

    /// Display name, never empty once stored
    fn name(&self) -> &str;

    /// Tags in insertion order
    fn tags(&self) -> &[String];

    /// Free-form status
    fn status(&self) -> &str;

    /// Containing entity, the zero sentinel when unset or for kinds without one
    fn target(&self) -> ObjectId {
        ObjectId::ZERO
    }
}

/// Atomic part, contained in an assembly or a kit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Display name
    pub name: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Status
    #[serde(default)]
    pub status: String,
    /// Assembly or kit this component belongs to
    #[serde(default)]
    pub target: ObjectId,
}

/// Group of components, contained in a kit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    /// Display name
    pub name: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Status
    #[serde(default)]
    pub status: String,
    /// Kit this assembly belongs to
    #[serde(default)]
    pub target: ObjectId,
}

/// Top-level grouping, never contained in anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kit {
    /// Display name
    pub name: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Status
    #[serde(default)]
    pub status: String,
}

/// An entity together with its store-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identified<T> {
    /// Store-assigned id
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Entity fields
    #[serde(flatten)]
    pub entity: T,
}

/// Component with its id
pub type ComponentWithId = Identified<Component>;
/// Assembly with its id
pub type AssemblyWithId = Identified<Assembly>;
/// Kit with its id
pub type KitWithId = Identified<Kit>;

impl<T: Entity> Identified<T> {
    /// Pair an entity with its id
    pub fn new(id: ObjectId, entity: T) -> Self {
        Self { id, entity }
    }
}

macro_rules! entity_common {
    () => {
        fn name(&self) -> &str {
            &self.name
        }

        fn tags(&self) -> &[String] {
            &self.tags
        }

        fn status(&self) -> &str {
            &self.status
        }
    };
}

impl Entity for Component {
    const KIND: EntityKind = EntityKind::Component;
    entity_common!();

    fn target(&self) -> ObjectId {
        self.target
    }
}

impl Entity for Assembly {
    const KIND: EntityKind = EntityKind::Assembly;
    entity_common!();

    fn target(&self) -> ObjectId {
        self.target
    }
}

impl Entity for Kit {
    const KIND: EntityKind = EntityKind::Kit;
    entity_common!();
}

impl Component {
    /// New untagged, uncontained component
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            status: String::new(),
            target: ObjectId::ZERO,
        }
    }
}

impl Assembly {
    /// New untagged, uncontained assembly
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            status: String::new(),
            target: ObjectId::ZERO,
        }
    }
}

impl Kit {
    /// New untagged kit
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            status: String::new(),
        }
    }
}

/// Full listing of all three collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// All components
    #[serde(default)]
    pub components: Vec<ComponentWithId>,
    /// All assemblies
    #[serde(default)]
    pub assemblies: Vec<AssemblyWithId>,
    /// All kits
    #[serde(default)]
    pub kits: Vec<KitWithId>,
}

impl CatalogSnapshot {
    /// Total number of entities
    pub fn len(&self) -> usize {
        self.components.len() + self.assemblies.len() + self.kits.len()
    }

    /// Whether all collections are empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
