//! Topology rebalancing.
//!
//! Keeps detail nodes from all hanging directly off the root goal. The
//! rebalancer is pluggable; [`HubRebalancer`] is the default.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::graph::{Edge, EdgeId, Node, NodeId, NodeType, WorkingGraph};
use crate::slot::{tokenize, SemanticSlot, SlotFamily, SlotValue};

use super::CleanupContext;

/// Re-routes edges so that the graph stays layered around its root.
///
/// Implementations must preserve graph invariants (the arena enforces them)
/// and must be idempotent when re-run on their own output.
pub trait TopologyRebalancer: Send + Sync {
    /// Rebalances the graph. Returns true if any edge moved or was dropped.
    fn rebalance(&self, graph: &mut WorkingGraph, ctx: &CleanupContext<'_>) -> bool;
}

/// Default rebalancer.
///
/// 1. Picks the root goal (locked, confirmed, confidence, id).
/// 2. Moves root edges of details with an obvious parent: a city duration to
///    the destination of the same city, a remaining budget to the budget.
/// 3. While the root has more than `max_root_fanout` incident edges, moves
///    secondary details (lodging, transport, activity, preferences, generic
///    facts) to the second-layer node sharing the most tokens, untouched and
///    oldest-touched details first.
///
/// A moved edge keeps its id, type and confidence. When the target already has
/// an edge with the same signature, the root edge is dropped instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct HubRebalancer;

impl HubRebalancer {
    /// Creates the rebalancer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn root_goal(graph: &WorkingGraph) -> Option<NodeId> {
    graph
        .nodes()
        .filter(|n| n.node_type == NodeType::Goal)
        .max_by(|a, b| {
            a.locked
                .cmp(&b.locked)
                .then_with(|| a.is_confirmed().cmp(&b.is_confirmed()))
                .then_with(|| a.confidence.total_cmp(&b.confidence))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|n| n.id.clone())
}

fn is_secondary(family: SlotFamily) -> bool {
    matches!(
        family,
        SlotFamily::Lodging
            | SlotFamily::Transport
            | SlotFamily::Activity
            | SlotFamily::Preference
            | SlotFamily::Generic
    )
}

fn other_end<'e>(edge: &'e Edge, root: &NodeId) -> &'e NodeId {
    if &edge.from == root {
        &edge.to
    } else {
        &edge.from
    }
}

/// Moves the root side of `edge` onto `target`. Returns true if the graph changed.
fn move_off_root(graph: &mut WorkingGraph, edge_id: &EdgeId, root: &NodeId, target: &NodeId) -> bool {
    let Some(edge) = graph.edge(edge_id) else {
        return false;
    };
    let (from, to) = if &edge.from == root {
        (target.clone(), edge.to.clone())
    } else {
        (edge.from.clone(), target.clone())
    };
    if from == to {
        return false;
    }

    let mut moved = edge.clone();
    moved.from = from.clone();
    moved.to = to.clone();
    if graph.has_signature(&moved.signature()) {
        tracing::trace!(edge = %edge_id, %from, %to, "target edge exists; dropping root edge");
        return graph.remove_edge(edge_id).is_some();
    }
    match graph.reroute_edge(edge_id, from, to) {
        Ok(()) => {
            tracing::trace!(edge = %edge_id, %target, "edge moved off root");
            true
        }
        Err(reason) => {
            tracing::trace!(edge = %edge_id, %reason, "edge move refused");
            false
        }
    }
}

fn obvious_parent(
    slot: &SemanticSlot,
    slots: &HashMap<NodeId, SemanticSlot>,
    graph: &WorkingGraph,
) -> Option<NodeId> {
    let candidates = graph.nodes().filter_map(|n| slots.get(&n.id).map(|s| (&n.id, s)));
    match (&slot.family, &slot.value) {
        (SlotFamily::DurationCity, SlotValue::PlaceDays { place, .. }) => candidates
            .filter(|(_, s)| s.family == SlotFamily::Destination && s.value.place() == Some(place.as_str()))
            .map(|(id, _)| id.clone())
            .next(),
        (SlotFamily::BudgetRemaining, _) => {
            let budgets: Vec<_> = candidates
                .filter(|(_, s)| s.family == SlotFamily::Budget)
                .collect();
            budgets
                .iter()
                .find(|(_, s)| s.key == SlotFamily::Budget.as_str())
                .or_else(|| budgets.first())
                .map(|(id, _)| (*id).clone())
        }
        _ => None,
    }
}

fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> usize {
    a.intersection(b).count()
}

impl TopologyRebalancer for HubRebalancer {
    fn rebalance(&self, graph: &mut WorkingGraph, ctx: &CleanupContext<'_>) -> bool {
        let Some(root) = root_goal(graph) else {
            return false;
        };
        let slots: HashMap<NodeId, SemanticSlot> = ctx.slot_index(graph).into_iter().collect();
        let mut changed = false;

        // Details with an obvious parent.
        let incident: Vec<Edge> = graph.edges_touching(&root).into_iter().cloned().collect();
        for edge in &incident {
            let detail = other_end(edge, &root);
            let Some(slot) = slots.get(detail) else {
                continue;
            };
            if let Some(parent) = obvious_parent(slot, &slots, graph) {
                if &parent != detail && parent != root {
                    changed |= move_off_root(graph, &edge.id, &root, &parent);
                }
            }
        }

        // Fan-out bound.
        let max_fanout = ctx.config.max_root_fanout;
        let incident: Vec<Edge> = graph.edges_touching(&root).into_iter().cloned().collect();
        if incident.len() <= max_fanout {
            return changed;
        }

        let family_of = |id: &NodeId| slots.get(id).map_or(SlotFamily::Generic, |s| s.family);
        let statement_tokens = |node: Option<&Node>| node.map(|n| tokenize(&n.statement)).unwrap_or_default();

        let hubs: Vec<(NodeId, BTreeSet<String>)> = incident
            .iter()
            .map(|e| other_end(e, &root))
            .filter(|id| {
                let family = family_of(*id);
                !is_secondary(family) && family != SlotFamily::Goal
            })
            .map(|id| (id.clone(), statement_tokens(graph.node(id))))
            .collect();
        if hubs.is_empty() {
            return changed;
        }

        let mut movable: Vec<&Edge> = incident
            .iter()
            .filter(|e| is_secondary(family_of(other_end(e, &root))))
            .collect();
        // Untouched first, then oldest touch; stable for equal keys.
        movable.sort_by(|a, b| {
            let seq = |e: &Edge| ctx.touch.sequence(other_end(e, &root));
            match (seq(*a), seq(*b)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => x.cmp(&y),
            }
        });

        let mut fanout = incident.len();
        for edge in movable {
            if fanout <= max_fanout {
                break;
            }
            let detail = other_end(edge, &root);
            let tokens = statement_tokens(graph.node(detail));
            let best = hubs
                .iter()
                .filter(|(hub, _)| hub != detail)
                .map(|(hub, hub_tokens)| (hub, overlap(&tokens, hub_tokens)))
                .filter(|(_, score)| *score > 0)
                .max_by(|(a, sa), (b, sb)| sa.cmp(sb).then_with(|| b.cmp(a)));
            let Some((hub, _)) = best else {
                continue;
            };
            if move_off_root(graph, &edge.id, &root, hub) {
                fanout -= 1;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::graph::{EdgeType, NodeType};
    use crate::patch::TouchLog;
    use crate::slot::RuleClassifier;

    fn run(graph: &mut WorkingGraph, max_root_fanout: usize) -> bool {
        let touch = TouchLog::new();
        let config = EngineConfig {
            max_root_fanout,
            ..EngineConfig::default()
        };
        let ctx = CleanupContext {
            touch: &touch,
            classifier: &RuleClassifier,
            config: &config,
        };
        HubRebalancer.rebalance(graph, &ctx)
    }

    fn node(g: &mut WorkingGraph, id: &str, node_type: NodeType, statement: &str) {
        g.insert_node(Node::new(id, node_type, statement)).unwrap();
    }

    #[test]
    fn test_city_duration_moves_to_destination() {
        let mut g = WorkingGraph::new();
        node(&mut g, "goal", NodeType::Goal, "Plan a trip");
        node(&mut g, "dest", NodeType::Fact, "目的地：米兰");
        node(&mut g, "days", NodeType::Fact, "米兰3天");
        g.insert_edge(Edge::new("e1", "dest", "goal", EdgeType::Enable)).unwrap();
        g.insert_edge(Edge::new("e2", "days", "goal", EdgeType::Determine).with_confidence(0.9))
            .unwrap();

        assert!(run(&mut g, 6));
        let moved = g.edge(&EdgeId::from("e2")).unwrap();
        assert_eq!(moved.from.as_str(), "days");
        assert_eq!(moved.to.as_str(), "dest");
        assert_eq!(moved.edge_type, EdgeType::Determine);
        assert!((moved.confidence - 0.9).abs() < f64::EPSILON);

        assert!(!run(&mut g, 6));
    }

    #[test]
    fn test_existing_signature_drops_root_edge() {
        let mut g = WorkingGraph::new();
        node(&mut g, "goal", NodeType::Goal, "Plan a trip");
        node(&mut g, "budget", NodeType::Constraint, "预算1万");
        node(&mut g, "left", NodeType::Fact, "剩余预算3000");
        g.insert_edge(Edge::new("e1", "left", "goal", EdgeType::Constraint)).unwrap();
        g.insert_edge(Edge::new("e2", "left", "budget", EdgeType::Constraint)).unwrap();

        assert!(run(&mut g, 6));
        assert!(!g.contains_edge(&EdgeId::from("e1")));
        assert!(g.contains_edge(&EdgeId::from("e2")));
    }

    #[test]
    fn test_fanout_bound_moves_secondary_details() {
        let mut g = WorkingGraph::new();
        node(&mut g, "goal", NodeType::Goal, "Plan a trip");
        node(&mut g, "dest", NodeType::Fact, "目的地：米兰");
        node(&mut g, "budget", NodeType::Constraint, "预算1万");
        node(&mut g, "hotel", NodeType::Preference, "米兰住四星酒店");
        node(&mut g, "museum", NodeType::Preference, "参观米兰大教堂");
        node(&mut g, "train", NodeType::Preference, "坐高铁");
        for (i, from) in ["dest", "budget", "hotel", "museum", "train"].iter().enumerate() {
            g.insert_edge(Edge::new(format!("e{i}"), *from, "goal", EdgeType::Enable)).unwrap();
        }

        assert!(run(&mut g, 3));
        assert_eq!(g.edges_touching(&NodeId::from("goal")).len(), 3);
        assert_eq!(g.edge(&EdgeId::from("e2")).unwrap().to.as_str(), "dest");
        assert_eq!(g.edge(&EdgeId::from("e3")).unwrap().to.as_str(), "dest");
        // Bound reached before the train detail.
        assert_eq!(g.edge(&EdgeId::from("e4")).unwrap().to.as_str(), "goal");

        assert!(!run(&mut g, 3));
    }

    #[test]
    fn test_no_goal_no_change() {
        let mut g = WorkingGraph::new();
        node(&mut g, "a", NodeType::Fact, "目的地：米兰");
        assert!(!run(&mut g, 1));
    }
}
