//! Graph node implementation

use crate::core::entity::{Entity, Identified};
use crate::core::types::{EntityKind, ObjectId};
use serde::{Deserialize, Serialize};

/// Node shape, named as Graphviz names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeShape {
    /// Default shape, used for components
    #[serde(rename = "ellipse")]
    Plain,
    /// Used for assemblies
    #[serde(rename = "box")]
    Box,
    /// Used for kits
    #[serde(rename = "diamond")]
    Diamond,
}

impl NodeShape {
    /// Shape drawn for an entity kind
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Component => NodeShape::Plain,
            EntityKind::Assembly => NodeShape::Box,
            EntityKind::Kit => NodeShape::Diamond,
        }
    }

    /// Graphviz shape attribute
    pub fn as_dot(self) -> &'static str {
        match self {
            NodeShape::Plain => "ellipse",
            NodeShape::Box => "box",
            NodeShape::Diamond => "diamond",
        }
    }
}

/// Graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Entity id
    pub id: ObjectId,
    /// Entity kind
    pub kind: EntityKind,
    /// Multi-line display label
    pub label: String,
    /// Drawn shape
    pub shape: NodeShape,
}

impl Node {
    /// Create a node for an identified entity
    pub fn for_entity<T: Entity>(entity: &Identified<T>) -> Self {
        Self {
            id: entity.id,
            kind: T::KIND,
            label: label_for(entity),
            shape: NodeShape::for_kind(T::KIND),
        }
    }
}

fn label_for<T: Entity>(entity: &Identified<T>) -> String {
    let mut label = format!("{}\n---\n{}", entity.id, entity.entity.name());
    let status = entity.entity.status();
    if !status.is_empty() {
        label.push_str("\nstatus: ");
        label.push_str(status);
    }
    let tags = entity.entity.tags();
    if !tags.is_empty() {
        label.push_str("\ntags: ");
        label.push_str(&tags.join(", "));
    }
    label
}
