//! Graph edge implementation

use crate::core::types::ObjectId;
use serde::{Deserialize, Serialize};

/// Directed containment edge, from an entity to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Contained entity
    pub from: ObjectId,
    /// Containing entity
    pub to: ObjectId,
}

impl Edge {
    /// Create a new edge
    pub fn new(from: ObjectId, to: ObjectId) -> Self {
        Self { from, to }
    }
}
