//! Immutable graph snapshots.
//!
//! `IntentGraph` is the sole persisted representation. It can only be built
//! through [`WorkingGraph`], either directly or by deserializing a
//! [`GraphSnapshot`], so duplicate ids, duplicate edge signatures, self-loops
//! and dangling edges never survive into a snapshot. Intake also drops blank
//! ids and statements and clamps confidences into `[0, 1]`.

use serde::{Deserialize, Serialize};

use super::edge::{Edge, DEFAULT_EDGE_CONFIDENCE};
use super::node::{Node, NodeId};
use super::working::WorkingGraph;

/// Raw wire shape of a graph snapshot, before invariants are enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A consistent intent graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GraphSnapshot", into = "GraphSnapshot")]
pub struct IntentGraph {
    id: String,
    version: u64,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl IntentGraph {
    /// Creates an empty graph at version 0.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: 0,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Builds a graph from untrusted parts, dropping anything that would break an invariant.
    #[must_use]
    pub fn from_parts(id: impl Into<String>, version: u64, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        GraphSnapshot {
            id: id.into(),
            version,
            nodes,
            edges,
        }
        .into()
    }

    /// Only `WorkingGraph` may call this; its parts are consistent by construction.
    pub(super) fn from_consistent_parts(
        id: String,
        version: u64,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Self {
        Self {
            id,
            version,
            nodes,
            edges,
        }
    }

    /// Graph identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Structural version counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Clamps `value` into `[0, 1]`; non-finite values become `fallback`.
fn repair_unit(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

fn repair_node(graph: &str, mut node: Node) -> Option<Node> {
    if node.id.as_str().trim().is_empty() || node.statement.trim().is_empty() {
        tracing::warn!(graph, node = %node.id, "dropping node with blank id or statement on snapshot intake");
        return None;
    }
    if !(0.0..=1.0).contains(&node.confidence) {
        let repaired = repair_unit(node.confidence, node.node_type.default_confidence());
        tracing::warn!(
            graph,
            node = %node.id,
            confidence = node.confidence,
            repaired,
            "clamping node confidence on snapshot intake"
        );
        node.confidence = repaired;
    }
    if let Some(importance) = node.importance.filter(|i| !(0.0..=1.0).contains(i)) {
        tracing::warn!(graph, node = %node.id, importance, "clamping node importance on snapshot intake");
        node.importance = importance.is_finite().then(|| importance.clamp(0.0, 1.0));
    }
    Some(node)
}

fn repair_edge(graph: &str, mut edge: Edge) -> Option<Edge> {
    if edge.id.as_str().trim().is_empty() {
        tracing::warn!(graph, from = %edge.from, to = %edge.to, "dropping edge with blank id on snapshot intake");
        return None;
    }
    if !(0.0..=1.0).contains(&edge.confidence) {
        let repaired = repair_unit(edge.confidence, DEFAULT_EDGE_CONFIDENCE);
        tracing::warn!(
            graph,
            edge = %edge.id,
            confidence = edge.confidence,
            repaired,
            "clamping edge confidence on snapshot intake"
        );
        edge.confidence = repaired;
    }
    Some(edge)
}

impl From<GraphSnapshot> for IntentGraph {
    fn from(raw: GraphSnapshot) -> Self {
        let mut working = WorkingGraph::new();
        let mut dropped = 0usize;
        for node in raw.nodes {
            let Some(node) = repair_node(&raw.id, node) else {
                dropped += 1;
                continue;
            };
            if let Err(reason) = working.insert_node(node) {
                tracing::warn!(graph = %raw.id, %reason, "dropping node on snapshot intake");
                dropped += 1;
            }
        }
        for edge in raw.edges {
            let Some(edge) = repair_edge(&raw.id, edge) else {
                dropped += 1;
                continue;
            };
            if let Err(reason) = working.insert_edge(edge) {
                tracing::warn!(graph = %raw.id, %reason, "dropping edge on snapshot intake");
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(graph = %raw.id, dropped, "snapshot repaired on intake");
        }
        working.into_graph(raw.id, raw.version)
    }
}

impl From<IntentGraph> for GraphSnapshot {
    fn from(graph: IntentGraph) -> Self {
        Self {
            id: graph.id,
            version: graph.version,
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, NodeType};
    use serde_json::json;

    #[test]
    fn test_deserialize_drops_invalid_structure() {
        let raw = json!({
            "id": "g1",
            "version": 4,
            "nodes": [
                {"id": "a", "type": "goal", "statement": "Plan a trip", "confidence": 0.7},
                {"id": "b", "type": "fact", "statement": "Budget 10000", "confidence": 0.8},
                {"id": "a", "type": "fact", "statement": "duplicate", "confidence": 0.8}
            ],
            "edges": [
                {"id": "e1", "from": "b", "to": "a", "type": "constraint", "confidence": 0.7},
                {"id": "e2", "from": "b", "to": "a", "type": "constraint", "confidence": 0.9},
                {"id": "e3", "from": "b", "to": "ghost", "type": "enable", "confidence": 0.9},
                {"id": "e4", "from": "a", "to": "a", "type": "enable", "confidence": 0.9}
            ]
        });

        let graph: IntentGraph = serde_json::from_value(raw).unwrap();
        assert_eq!(graph.version(), 4);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].id.as_str(), "e1");
        assert_eq!(graph.node(&NodeId::from("a")).unwrap().statement, "Plan a trip");
    }

    #[test]
    fn test_deserialize_repairs_values() {
        let raw = json!({
            "id": "g1",
            "version": 2,
            "nodes": [
                {"id": "a", "type": "goal", "statement": "Plan a trip", "confidence": 3.5},
                {"id": "b", "type": "fact", "statement": "   ", "confidence": 0.8},
                {"id": "", "type": "fact", "statement": "no id", "confidence": 0.8},
                {"id": "c", "type": "fact", "statement": "目的地：米兰", "confidence": -1.0, "importance": 7.0}
            ],
            "edges": [
                {"id": "", "from": "c", "to": "a", "type": "enable", "confidence": 0.7},
                {"id": "e2", "from": "c", "to": "a", "type": "determine", "confidence": 9.0}
            ]
        });

        let graph: IntentGraph = serde_json::from_value(raw).unwrap();
        assert_eq!(graph.node_count(), 2);
        let a = graph.node(&NodeId::from("a")).unwrap();
        assert!((a.confidence - 1.0).abs() < f64::EPSILON);
        let c = graph.node(&NodeId::from("c")).unwrap();
        assert!(c.confidence.abs() < f64::EPSILON);
        assert_eq!(c.importance, Some(1.0));

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges()[0].id.as_str(), "e2");
        assert!((graph.edges()[0].confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_parts_replaces_non_finite_confidence() {
        let mut node = Node::new("a", NodeType::Fact, "目的地：米兰");
        node.confidence = f64::NAN;
        let mut edge = Edge::new("e1", "a", "g", EdgeType::Enable);
        edge.confidence = f64::INFINITY;
        let graph = IntentGraph::from_parts(
            "g1",
            1,
            vec![node, Node::new("g", NodeType::Goal, "Plan a trip")],
            vec![edge],
        );

        let a = graph.node(&NodeId::from("a")).unwrap();
        assert!((a.confidence - NodeType::Fact.default_confidence()).abs() < f64::EPSILON);
        assert!((graph.edges()[0].confidence - DEFAULT_EDGE_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serialize_shape() {
        let graph = IntentGraph::from_parts(
            "g1",
            1,
            vec![
                Node::new("a", NodeType::Goal, "Plan a trip"),
                Node::new("b", NodeType::Fact, "Budget"),
            ],
            vec![Edge::new("e1", "b", "a", EdgeType::Enable)],
        );
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["id"], "g1");
        assert_eq!(json["version"], 1);
        assert_eq!(json["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(json["edges"][0]["type"], "enable");
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph = IntentGraph::new("g");
        assert!(graph.is_empty());
        assert_eq!(graph.version(), 0);
    }
}
