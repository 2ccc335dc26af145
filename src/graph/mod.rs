//! Relationship graph of the catalog
//!
//! Nodes are entities, edges point from an entity to the entity that
//! contains it. See [`build_graph`].

pub mod node;
pub mod edge;
pub mod builder;
pub mod render;

pub use builder::build_graph;
pub use edge::Edge;
pub use node::{Node, NodeShape};
pub use render::{render, render_image};

use crate::core::error::GraphError;
use crate::core::types::ObjectId;
use serde::Serialize;
use std::collections::HashMap;

/// Default graph title
pub const DEFAULT_LABEL: &str = "haul graph";

/// Directed graph with nodes unique by id
#[derive(Debug, Clone, Serialize)]
pub struct Graph {
    label: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<ObjectId, usize>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Replace the graph title
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Graph title
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Node by id
    pub fn node(&self, id: ObjectId) -> Option<&Node> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Add a node; ids must be unique
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode { id: node.id });
        }
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    // Endpoints are checked by the builder.
    fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL)
    }
}
