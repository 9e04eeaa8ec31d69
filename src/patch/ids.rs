//! Temporary-id rewriting.
//!
//! Producers refer to nodes and edges they are creating by temporary ids
//! (`t_1`, `tmp_goal`, ...). Before application every temporary id introduced
//! by an `add_node` or `add_edge` op is assigned a fresh stable id, and every
//! reference to it anywhere in the patch is rewritten. A second add op in the
//! same patch that re-uses an id not present in the graph gets its own fresh
//! id instead of being rejected.
//!
//! Fresh ids are UUID v5 values derived from the graph id, graph version, op
//! ordinal and original id, so the rewrite is deterministic.

use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::graph::{EdgeId, IntentGraph, NodeId};
use crate::ir::{collapse_whitespace, GraphPatch, PatchOp};

/// Result of rewriting a patch's temporary ids.
#[derive(Debug, Clone, Default)]
pub struct IdRewrite {
    /// Ops with every mapped id replaced.
    pub ops: Vec<PatchOp>,
    /// Temporary id to stable id.
    pub map: BTreeMap<String, String>,
}

#[derive(Clone, Copy)]
enum IdKind {
    Node,
    Edge,
}

impl IdKind {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Node => "n_",
            Self::Edge => "e_",
        }
    }
}

fn fresh_id(graph: &IntentGraph, ordinal: usize, original: &str, kind: IdKind) -> String {
    let name = format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}",
        graph.id(),
        graph.version(),
        ordinal,
        original
    );
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes());
    format!("{}{}", kind.prefix(), uuid.simple())
}

/// Rewrites temporary and intra-patch duplicate ids to fresh stable ids.
#[must_use]
pub fn rewrite_ids(graph: &IntentGraph, patch: &GraphPatch, config: &EngineConfig) -> IdRewrite {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    let mut seen_nodes: HashSet<String> = HashSet::new();
    let mut seen_edges: HashSet<String> = HashSet::new();
    // Ordinal -> replacement id for add ops whose own id changes.
    let mut replacements: BTreeMap<usize, String> = BTreeMap::new();

    for (ordinal, op) in patch.ops.iter().enumerate() {
        let (raw_id, kind, seen) = match op {
            PatchOp::AddNode { node } => (node.id.as_deref(), IdKind::Node, &mut seen_nodes),
            PatchOp::AddEdge { edge } => (edge.id.as_deref(), IdKind::Edge, &mut seen_edges),
            _ => continue,
        };
        let id = collapse_whitespace(raw_id.unwrap_or_default());
        if id.is_empty() {
            continue;
        }

        let in_graph = match kind {
            IdKind::Node => graph.node(&NodeId::new(id.as_str())).is_some(),
            IdKind::Edge => graph.edges().iter().any(|e| e.id == EdgeId::new(id.as_str())),
        };
        let first_use = seen.insert(id.clone());

        if config.is_temp_id(&id) {
            let fresh = fresh_id(graph, ordinal, &id, kind);
            if first_use {
                map.insert(id.clone(), fresh.clone());
            } else {
                tracing::debug!(ordinal, %id, %fresh, "regenerating repeated temporary id");
            }
            replacements.insert(ordinal, fresh);
        } else if !first_use && !in_graph {
            let fresh = fresh_id(graph, ordinal, &id, kind);
            tracing::debug!(ordinal, %id, %fresh, "regenerating duplicate id within patch");
            replacements.insert(ordinal, fresh);
        }
    }

    let resolve = |s: &str| -> String {
        let collapsed = collapse_whitespace(s);
        map.get(&collapsed).cloned().unwrap_or(collapsed)
    };

    let ops = patch
        .ops
        .iter()
        .enumerate()
        .map(|(ordinal, op)| {
            let own = replacements.get(&ordinal).cloned();
            match op {
                PatchOp::AddNode { node } => {
                    let mut node = node.clone();
                    node.id = own.or_else(|| node.id.as_deref().map(&resolve));
                    PatchOp::AddNode { node }
                }
                PatchOp::AddEdge { edge } => {
                    let mut edge = edge.clone();
                    edge.id = own.or_else(|| edge.id.as_deref().map(&resolve));
                    edge.from = edge.from.as_deref().map(&resolve);
                    edge.to = edge.to.as_deref().map(&resolve);
                    PatchOp::AddEdge { edge }
                }
                PatchOp::UpdateNode { id, patch } => PatchOp::UpdateNode {
                    id: resolve(id),
                    patch: patch.clone(),
                },
                PatchOp::RemoveNode { id } => PatchOp::RemoveNode { id: resolve(id) },
                PatchOp::RemoveEdge { id } => PatchOp::RemoveEdge { id: resolve(id) },
            }
        })
        .collect();

    IdRewrite { ops, map }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Node, NodeType};
    use crate::ir::{RawEdge, RawNode};

    fn patch() -> GraphPatch {
        GraphPatch::new(vec![
            PatchOp::AddNode {
                node: RawNode::new("t_goal", "goal", "Plan a trip"),
            },
            PatchOp::AddNode {
                node: RawNode::new("t_dest", "fact", "目的地：米兰"),
            },
            PatchOp::AddEdge {
                edge: RawEdge::new("t_e1", "t_dest", "t_goal", "enable"),
            },
            PatchOp::UpdateNode {
                id: "t_dest".to_string(),
                patch: RawNode::default().with_status("confirmed"),
            },
        ])
    }

    #[test]
    fn test_temp_ids_rewritten_everywhere() {
        let graph = IntentGraph::new("g1");
        let rewrite = rewrite_ids(&graph, &patch(), &EngineConfig::default());

        assert_eq!(rewrite.map.len(), 3);
        let goal = &rewrite.map["t_goal"];
        let dest = &rewrite.map["t_dest"];
        assert!(goal.starts_with("n_"));
        assert!(rewrite.map["t_e1"].starts_with("e_"));

        let PatchOp::AddEdge { edge } = &rewrite.ops[2] else {
            panic!("expected add_edge");
        };
        assert_eq!(edge.from.as_ref(), Some(dest));
        assert_eq!(edge.to.as_ref(), Some(goal));
        assert!(matches!(&rewrite.ops[3], PatchOp::UpdateNode { id, .. } if id == dest));
    }

    #[test]
    fn test_rewrite_is_deterministic() {
        let graph = IntentGraph::new("g1");
        let a = rewrite_ids(&graph, &patch(), &EngineConfig::default());
        let b = rewrite_ids(&graph, &patch(), &EngineConfig::default());
        assert_eq!(a.map, b.map);

        let other = IntentGraph::new("g2");
        let c = rewrite_ids(&other, &patch(), &EngineConfig::default());
        assert_ne!(a.map["t_goal"], c.map["t_goal"]);
    }

    #[test]
    fn test_duplicate_explicit_id_regenerated() {
        let graph = IntentGraph::new("g1");
        let patch = GraphPatch::new(vec![
            PatchOp::AddNode {
                node: RawNode::new("dest", "fact", "目的地：米兰"),
            },
            PatchOp::AddNode {
                node: RawNode::new("dest", "fact", "目的地：罗马"),
            },
        ]);
        let rewrite = rewrite_ids(&graph, &patch, &EngineConfig::default());
        let ids: Vec<_> = rewrite
            .ops
            .iter()
            .filter_map(|op| match op {
                PatchOp::AddNode { node } => node.id.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(ids[0], "dest");
        assert_ne!(ids[1], "dest");
        assert!(rewrite.map.is_empty());
    }

    #[test]
    fn test_existing_id_left_alone() {
        let graph = IntentGraph::from_parts("g1", 1, vec![Node::new("dest", NodeType::Fact, "x")], vec![]);
        let patch = GraphPatch::new(vec![
            PatchOp::AddNode {
                node: RawNode::new("dest", "fact", "y"),
            },
            PatchOp::AddNode {
                node: RawNode::new("dest", "fact", "z"),
            },
        ]);
        let rewrite = rewrite_ids(&graph, &patch, &EngineConfig::default());
        for op in &rewrite.ops {
            assert!(matches!(op, PatchOp::AddNode { node } if node.id.as_deref() == Some("dest")));
        }
    }
}
