//! Singleton-slot compactor.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::graph::{Node, NodeId, WorkingGraph};
use crate::patch::TouchLog;
use crate::slot::{SemanticSlot, SlotValue};

use super::{prune_node, CleanupContext, CleanupPass};

/// Keeps one node per semantic slot.
///
/// If a slot holds locked nodes, every unlocked member is removed and the
/// locked ones stay. Otherwise a single winner is chosen by [`compare_candidates`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotCompactor;

/// A node competing for a slot.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub node: &'a Node,
    pub slot: &'a SemanticSlot,
}

/// Orders two candidates of the same slot; the greater one wins.
///
/// Chain: touch sequence, touched over untouched, confirmed, confidence,
/// importance, explicit then longer totals (duration totals only), id.
#[must_use]
pub fn compare_candidates(a: Candidate<'_>, b: Candidate<'_>, touch: &TouchLog) -> Ordering {
    let seq_a = touch.sequence(&a.node.id);
    let seq_b = touch.sequence(&b.node.id);

    let by_sequence = match (seq_a, seq_b) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    };

    by_sequence
        .then_with(|| seq_a.is_some().cmp(&seq_b.is_some()))
        .then_with(|| a.node.is_confirmed().cmp(&b.node.is_confirmed()))
        .then_with(|| a.node.confidence.total_cmp(&b.node.confidence))
        .then_with(|| {
            a.node
                .importance
                .unwrap_or(0.0)
                .total_cmp(&b.node.importance.unwrap_or(0.0))
        })
        .then_with(|| match (&a.slot.value, &b.slot.value) {
            (
                SlotValue::TotalDays {
                    days: days_a,
                    explicit: explicit_a,
                },
                SlotValue::TotalDays {
                    days: days_b,
                    explicit: explicit_b,
                },
            ) => explicit_a.cmp(explicit_b).then(days_a.cmp(days_b)),
            _ => Ordering::Equal,
        })
        .then_with(|| a.node.id.cmp(&b.node.id))
}

impl CleanupPass for SlotCompactor {
    fn name(&self) -> &'static str {
        "slot_compaction"
    }

    fn run(&self, graph: &mut WorkingGraph, ctx: &CleanupContext<'_>) -> bool {
        let slots = ctx.slot_index(graph);
        let mut groups: BTreeMap<&str, Vec<(&NodeId, &SemanticSlot)>> = BTreeMap::new();
        for (id, slot) in &slots {
            groups.entry(slot.key.as_str()).or_default().push((id, slot));
        }

        let mut losers: Vec<NodeId> = Vec::new();
        for (key, members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
            let candidates: Vec<Candidate<'_>> = members
                .iter()
                .filter_map(|(id, slot)| graph.node(id).map(|node| Candidate { node, slot }))
                .collect();

            if candidates.iter().any(|c| c.node.locked) {
                losers.extend(
                    candidates
                        .iter()
                        .filter(|c| !c.node.locked)
                        .map(|c| c.node.id.clone()),
                );
                continue;
            }

            let Some(winner) = candidates
                .iter()
                .copied()
                .max_by(|a, b| compare_candidates(*a, *b, ctx.touch))
            else {
                continue;
            };
            tracing::trace!(slot = key, winner = %winner.node.id, members = candidates.len(), "compacting slot");
            losers.extend(
                candidates
                    .iter()
                    .filter(|c| c.node.id != winner.node.id)
                    .map(|c| c.node.id.clone()),
            );
        }

        let mut changed = false;
        for id in &losers {
            changed |= prune_node(graph, id, self.name());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::graph::{NodeStatus, NodeType};
    use crate::slot::RuleClassifier;

    fn run(graph: &mut WorkingGraph, touch: &TouchLog) -> bool {
        let config = EngineConfig::default();
        let ctx = CleanupContext {
            touch,
            classifier: &RuleClassifier,
            config: &config,
        };
        SlotCompactor.run(graph, &ctx)
    }

    fn ids(graph: &WorkingGraph) -> Vec<String> {
        graph.nodes().map(|n| n.id.as_str().to_string()).collect()
    }

    #[test]
    fn test_latest_touch_wins() {
        let mut g = WorkingGraph::new();
        g.insert_node(Node::new("a", NodeType::Fact, "目的地：米兰").with_confidence(0.99)).unwrap();
        g.insert_node(Node::new("b", NodeType::Fact, "目的地：米兰").with_confidence(0.1)).unwrap();
        let mut touch = TouchLog::new();
        touch.touch(&NodeId::from("a"));
        touch.touch(&NodeId::from("b"));

        assert!(run(&mut g, &touch));
        assert_eq!(ids(&g), vec!["b"]);
    }

    #[test]
    fn test_touched_beats_confirmed() {
        let mut g = WorkingGraph::new();
        g.insert_node(Node::new("old", NodeType::Constraint, "预算1万").with_status(NodeStatus::Confirmed))
            .unwrap();
        g.insert_node(Node::new("new", NodeType::Constraint, "预算2万")).unwrap();
        let mut touch = TouchLog::new();
        touch.touch(&NodeId::from("new"));

        assert!(run(&mut g, &touch));
        assert_eq!(ids(&g), vec!["new"]);
    }

    #[test]
    fn test_untouched_chain_and_id_tiebreak() {
        let mut g = WorkingGraph::new();
        g.insert_node(Node::new("a", NodeType::Constraint, "预算1万")).unwrap();
        g.insert_node(Node::new("b", NodeType::Constraint, "预算1万")).unwrap();
        g.insert_node(Node::new("c", NodeType::Constraint, "预算1万").with_importance(0.9)).unwrap();
        g.insert_node(Node::new("d", NodeType::Constraint, "预算1万")).unwrap();

        assert!(run(&mut g, &TouchLog::new()));
        assert_eq!(ids(&g), vec!["c"]);
    }

    #[test]
    fn test_explicit_total_preferred() {
        let mut g = WorkingGraph::new();
        g.insert_node(Node::new("inferred", NodeType::Fact, "行程12天")).unwrap();
        g.insert_node(Node::new("explicit", NodeType::Fact, "总共8天")).unwrap();

        assert!(run(&mut g, &TouchLog::new()));
        assert_eq!(ids(&g), vec!["explicit"]);
    }

    #[test]
    fn test_locked_members_survive() {
        let mut g = WorkingGraph::new();
        g.insert_node(Node::new("a", NodeType::Fact, "目的地：米兰").locked()).unwrap();
        g.insert_node(Node::new("b", NodeType::Fact, "目的地：米兰")).unwrap();
        let mut touch = TouchLog::new();
        touch.touch(&NodeId::from("b"));

        assert!(run(&mut g, &touch));
        assert_eq!(ids(&g), vec!["a"]);
        assert!(!run(&mut g, &TouchLog::new()));
    }
}
