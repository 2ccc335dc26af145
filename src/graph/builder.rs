//! Relationship graph construction
//!
//! Two passes: a node for every entity, then an edge for every non-zero
//! target. A target that names no node, or a node of a kind that cannot
//! contain the source, fails the whole build. Edges are never dropped.

use crate::core::entity::{AssemblyWithId, ComponentWithId, Entity, Identified, KitWithId};
use crate::core::error::GraphError;
use crate::graph::{Edge, Graph, Node};
use tracing::debug;

/// Build the containment graph of the given entities
pub fn build_graph(
    components: &[ComponentWithId],
    assemblies: &[AssemblyWithId],
    kits: &[KitWithId],
) -> Result<Graph, GraphError> {
    let mut graph = Graph::default();

    // Nodes
    for component in components {
        graph.add_node(Node::for_entity(component))?;
    }
    for assembly in assemblies {
        graph.add_node(Node::for_entity(assembly))?;
    }
    for kit in kits {
        graph.add_node(Node::for_entity(kit))?;
    }

    // Edges; kits have no target
    for component in components {
        link(&mut graph, component)?;
    }
    for assembly in assemblies {
        link(&mut graph, assembly)?;
    }

    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "Graph built");
    Ok(graph)
}

fn link<T: Entity>(graph: &mut Graph, entity: &Identified<T>) -> Result<(), GraphError> {
    let target = entity.entity.target();
    if target.is_zero() {
        return Ok(());
    }

    let target_kind = graph
        .node(target)
        .map(|node| node.kind)
        .ok_or(GraphError::DanglingTarget {
            kind: T::KIND,
            from: entity.id,
            target,
        })?;

    if !T::KIND.legal_targets().contains(&target_kind) {
        return Err(GraphError::IllegalTarget {
            kind: T::KIND,
            from: entity.id,
            target_kind,
            target,
        });
    }

    graph.push_edge(Edge::new(entity.id, target));
    Ok(())
}
