//! Mutable working graph used while applying a patch.
//!
//! Nodes and edges live in an arena keyed by monotonically assigned integer
//! slots, so iteration order equals insertion order. Auxiliary indices map ids
//! and edge signatures to slots. Every mutation goes through methods that
//! refuse duplicate node ids, duplicate edge ids, duplicate `(from, to, type)`
//! signatures, self-loops and dangling endpoints, which makes those states
//! unrepresentable in any graph built from a `WorkingGraph`.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use super::edge::{Edge, EdgeId, EdgeSignature};
use super::node::{Node, NodeId};
use super::snapshot::IntentGraph;

/// Why the arena refused a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaRejection {
    #[error("node id '{0}' already exists")]
    DuplicateNodeId(NodeId),

    #[error("edge id '{0}' already exists")]
    DuplicateEdgeId(EdgeId),

    #[error("edge signature {from} -[{edge_type}]-> {to} already exists")]
    DuplicateSignature {
        from: NodeId,
        to: NodeId,
        edge_type: super::edge::EdgeType,
    },

    #[error("edge endpoint '{0}' does not exist")]
    MissingEndpoint(NodeId),

    #[error("edge '{0}' would be a self-loop")]
    SelfLoop(EdgeId),

    #[error("node '{0}' does not exist")]
    UnknownNode(NodeId),

    #[error("edge '{0}' does not exist")]
    UnknownEdge(EdgeId),
}

/// Arena-backed graph enforcing structural invariants on every mutation.
#[derive(Debug, Clone, Default)]
pub struct WorkingGraph {
    nodes: BTreeMap<usize, Node>,
    node_slots: HashMap<NodeId, usize>,
    edges: BTreeMap<usize, Edge>,
    edge_slots: HashMap<EdgeId, usize>,
    signatures: HashMap<EdgeSignature, EdgeId>,
    next_slot: usize,
}

impl WorkingGraph {
    /// Creates an empty working graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a snapshot. Snapshots are already consistent, so nothing is dropped.
    #[must_use]
    pub fn from_graph(graph: &IntentGraph) -> Self {
        let mut working = Self::new();
        for node in graph.nodes() {
            let _ = working.insert_node(node.clone());
        }
        for edge in graph.edges() {
            let _ = working.insert_edge(edge.clone());
        }
        working
    }

    fn take_slot(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /// Number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_slots.get(id).and_then(|slot| self.nodes.get(slot))
    }

    /// Returns true if the node exists.
    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_slots.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Looks up an edge.
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_slots.get(id).and_then(|slot| self.edges.get(slot))
    }

    /// Returns true if the edge exists.
    #[must_use]
    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edge_slots.contains_key(id)
    }

    /// Returns true if an edge with this signature exists.
    #[must_use]
    pub fn has_signature(&self, signature: &EdgeSignature) -> bool {
        self.signatures.contains_key(signature)
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges with `node` as either endpoint, in insertion order.
    #[must_use]
    pub fn edges_touching(&self, node: &NodeId) -> Vec<&Edge> {
        self.edges.values().filter(|e| e.touches(node)).collect()
    }

    /// Inserts a new node.
    pub fn insert_node(&mut self, node: Node) -> Result<(), ArenaRejection> {
        if self.node_slots.contains_key(&node.id) {
            return Err(ArenaRejection::DuplicateNodeId(node.id));
        }
        let slot = self.take_slot();
        self.node_slots.insert(node.id.clone(), slot);
        self.nodes.insert(slot, node);
        Ok(())
    }

    /// Replaces an existing node in place, keeping its position. Returns the previous value.
    pub fn replace_node(&mut self, node: Node) -> Result<Node, ArenaRejection> {
        let Some(&slot) = self.node_slots.get(&node.id) else {
            return Err(ArenaRejection::UnknownNode(node.id));
        };
        let id = node.id.clone();
        self.nodes.insert(slot, node).ok_or(ArenaRejection::UnknownNode(id))
    }

    /// Removes a node and every edge touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<(Node, Vec<Edge>)> {
        let slot = self.node_slots.remove(id)?;
        let node = self.nodes.remove(&slot)?;

        let touching: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.touches(id))
            .map(|e| e.id.clone())
            .collect();
        let removed = touching
            .iter()
            .filter_map(|edge_id| self.remove_edge(edge_id))
            .collect();

        Some((node, removed))
    }

    /// Inserts a new edge after checking every structural invariant.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), ArenaRejection> {
        self.check_edge(&edge, None)?;
        let slot = self.take_slot();
        self.signatures.insert(edge.signature(), edge.id.clone());
        self.edge_slots.insert(edge.id.clone(), slot);
        self.edges.insert(slot, edge);
        Ok(())
    }

    /// Removes an edge.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        let slot = self.edge_slots.remove(id)?;
        let edge = self.edges.remove(&slot)?;
        self.signatures.remove(&edge.signature());
        Some(edge)
    }

    /// Moves an edge to new endpoints, keeping its id, type, confidence and position.
    pub fn reroute_edge(
        &mut self,
        id: &EdgeId,
        from: NodeId,
        to: NodeId,
    ) -> Result<(), ArenaRejection> {
        let Some(&slot) = self.edge_slots.get(id) else {
            return Err(ArenaRejection::UnknownEdge(id.clone()));
        };
        let Some(current) = self.edges.get(&slot) else {
            return Err(ArenaRejection::UnknownEdge(id.clone()));
        };
        let old_signature = current.signature();
        let mut moved = current.clone();
        moved.from = from;
        moved.to = to;
        self.check_edge(&moved, Some(id))?;

        self.signatures.remove(&old_signature);
        self.signatures.insert(moved.signature(), moved.id.clone());
        self.edges.insert(slot, moved);
        Ok(())
    }

    fn check_edge(&self, edge: &Edge, replacing: Option<&EdgeId>) -> Result<(), ArenaRejection> {
        if replacing.is_none() && self.edge_slots.contains_key(&edge.id) {
            return Err(ArenaRejection::DuplicateEdgeId(edge.id.clone()));
        }
        if edge.from == edge.to {
            return Err(ArenaRejection::SelfLoop(edge.id.clone()));
        }
        for endpoint in [&edge.from, &edge.to] {
            if !self.node_slots.contains_key(endpoint) {
                return Err(ArenaRejection::MissingEndpoint(endpoint.clone()));
            }
        }
        if let Some(owner) = self.signatures.get(&edge.signature()) {
            if Some(owner) != replacing {
                return Err(ArenaRejection::DuplicateSignature {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    edge_type: edge.edge_type,
                });
            }
        }
        Ok(())
    }

    /// Freezes the working graph into a snapshot.
    #[must_use]
    pub fn into_graph(self, id: impl Into<String>, version: u64) -> IntentGraph {
        IntentGraph::from_consistent_parts(
            id.into(),
            version,
            self.nodes.into_values().collect(),
            self.edges.into_values().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, NodeType};

    fn two_nodes() -> WorkingGraph {
        let mut g = WorkingGraph::new();
        g.insert_node(Node::new("a", NodeType::Goal, "goal")).unwrap();
        g.insert_node(Node::new("b", NodeType::Fact, "fact")).unwrap();
        g
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut g = two_nodes();
        let err = g.insert_node(Node::new("a", NodeType::Fact, "dup")).unwrap_err();
        assert_eq!(err, ArenaRejection::DuplicateNodeId(NodeId::from("a")));
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn test_edge_invariants() {
        let mut g = two_nodes();
        g.insert_edge(Edge::new("e1", "b", "a", EdgeType::Enable)).unwrap();

        assert!(matches!(
            g.insert_edge(Edge::new("e1", "a", "b", EdgeType::Enable)),
            Err(ArenaRejection::DuplicateEdgeId(_))
        ));
        assert!(matches!(
            g.insert_edge(Edge::new("e2", "b", "a", EdgeType::Enable)),
            Err(ArenaRejection::DuplicateSignature { .. })
        ));
        assert!(matches!(
            g.insert_edge(Edge::new("e3", "b", "zzz", EdgeType::Enable)),
            Err(ArenaRejection::MissingEndpoint(_))
        ));
        assert!(matches!(
            g.insert_edge(Edge::new("e4", "a", "a", EdgeType::Enable)),
            Err(ArenaRejection::SelfLoop(_))
        ));

        // Same pair, different type is fine.
        g.insert_edge(Edge::new("e5", "b", "a", EdgeType::Determine)).unwrap();
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut g = two_nodes();
        g.insert_edge(Edge::new("e1", "b", "a", EdgeType::Enable)).unwrap();
        let (node, removed) = g.remove_node(&NodeId::from("b")).unwrap();
        assert_eq!(node.id.as_str(), "b");
        assert_eq!(removed.len(), 1);
        assert_eq!(g.edge_count(), 0);
        // Signature is free again.
        g.insert_node(Node::new("b", NodeType::Fact, "fact")).unwrap();
        g.insert_edge(Edge::new("e2", "b", "a", EdgeType::Enable)).unwrap();
    }

    #[test]
    fn test_reroute_keeps_position_and_id() {
        let mut g = two_nodes();
        g.insert_node(Node::new("c", NodeType::Fact, "detail")).unwrap();
        g.insert_edge(Edge::new("e1", "c", "a", EdgeType::Enable)).unwrap();
        g.insert_edge(Edge::new("e2", "b", "a", EdgeType::Enable)).unwrap();

        g.reroute_edge(&EdgeId::from("e1"), NodeId::from("c"), NodeId::from("b"))
            .unwrap();
        let order: Vec<_> = g.edges().map(|e| e.id.as_str().to_string()).collect();
        assert_eq!(order, vec!["e1", "e2"]);
        assert_eq!(g.edge(&EdgeId::from("e1")).unwrap().to.as_str(), "b");

        // Rerouting onto an existing signature is refused.
        assert!(g
            .reroute_edge(&EdgeId::from("e1"), NodeId::from("b"), NodeId::from("a"))
            .is_err());
    }

    #[test]
    fn test_insertion_order_preserved_in_snapshot() {
        let mut g = WorkingGraph::new();
        for id in ["z", "m", "a"] {
            g.insert_node(Node::new(id, NodeType::Fact, id)).unwrap();
        }
        let graph = g.into_graph("g", 3);
        let ids: Vec<_> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "m", "a"]);
        assert_eq!(graph.version(), 3);
    }
}
