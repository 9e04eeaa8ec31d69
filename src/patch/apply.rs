//! Patch application.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cleanup::{self, CleanupContext, CleanupReport, HubRebalancer, TopologyRebalancer};
use crate::config::EngineConfig;
use crate::graph::{EdgeId, IntentGraph, NodeId, WorkingGraph};
use crate::ir::{
    collapse_whitespace, normalize_edge, normalize_node, normalize_node_patch, AppliedOp,
    AppliedPatch, GraphPatch, PatchOp,
};
use crate::slot::{RuleClassifier, SlotClassifier};

use super::ids::rewrite_ids;
use super::touch::TouchLog;

/// Result of applying a patch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutcome {
    /// The rebuilt graph.
    pub graph: IntentGraph,
    /// Ops that were applied and whose effect survived cleanup.
    pub applied: AppliedPatch,
    /// Temporary id to stable id.
    pub id_map: BTreeMap<String, String>,
    /// What each cleanup pass did.
    pub report: CleanupReport,
}

impl PatchOutcome {
    /// Returns true if the graph version was bumped.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty() || self.report.changed()
    }
}

/// Applies patches against graph snapshots.
pub struct PatchApplier<'a> {
    config: &'a EngineConfig,
    classifier: &'a dyn SlotClassifier,
    rebalancer: &'a dyn TopologyRebalancer,
}

impl<'a> PatchApplier<'a> {
    /// Creates an applier with explicit collaborators.
    #[must_use]
    pub fn new(
        config: &'a EngineConfig,
        classifier: &'a dyn SlotClassifier,
        rebalancer: &'a dyn TopologyRebalancer,
    ) -> Self {
        Self {
            config,
            classifier,
            rebalancer,
        }
    }

    /// Applies `patch` to `graph`, returning a new snapshot. Never fails:
    /// ops that do not pass their guards are dropped from the applied output.
    #[must_use]
    pub fn apply(&self, graph: &IntentGraph, patch: &GraphPatch) -> PatchOutcome {
        let span = tracing::debug_span!(
            "apply_patch",
            graph = %graph.id(),
            version = graph.version(),
            ops = patch.ops.len()
        );
        let _enter = span.enter();

        let rewrite = rewrite_ids(graph, patch, self.config);
        let mut working = WorkingGraph::from_graph(graph);
        backfill_layers(&mut working);

        let mut touch = TouchLog::new();
        let mut applied = Vec::with_capacity(rewrite.ops.len());
        for (ordinal, op) in rewrite.ops.iter().enumerate() {
            match self.apply_op(&mut working, &mut touch, op) {
                Some(done) => applied.push(done),
                None => tracing::debug!(ordinal, op = op.name(), "op dropped"),
            }
        }

        let ctx = CleanupContext {
            touch: &touch,
            classifier: self.classifier,
            config: self.config,
        };
        let report = cleanup::run_passes(&mut working, &ctx, self.rebalancer);

        let applied_count = applied.len();
        applied.retain(|op| survives(op, &working));
        if applied.len() < applied_count {
            tracing::debug!(
                undone = applied_count - applied.len(),
                "applied ops undone by cleanup"
            );
        }

        let applied = AppliedPatch {
            ops: applied,
            notes: patch.notes.clone(),
        };
        let changed = !applied.is_empty() || report.changed();
        let version = if changed {
            graph.version() + 1
        } else {
            graph.version()
        };
        tracing::debug!(applied = applied.len(), changed, version, "patch applied");

        PatchOutcome {
            graph: working.into_graph(graph.id(), version),
            applied,
            id_map: rewrite.map,
            report,
        }
    }

    fn apply_op(
        &self,
        working: &mut WorkingGraph,
        touch: &mut TouchLog,
        op: &PatchOp,
    ) -> Option<AppliedOp> {
        match op {
            PatchOp::AddNode { node } => {
                let node = normalize_node(node)?;
                if working.contains_node(&node.id) {
                    tracing::trace!(id = %node.id, "add_node: id already present");
                    return None;
                }
                working.insert_node(node.clone()).ok()?;
                touch.touch(&node.id);
                Some(AppliedOp::AddNode { node })
            }
            PatchOp::UpdateNode { id, patch } => {
                let id = NodeId::new(collapse_whitespace(id));
                let current = working.node(&id)?;
                if current.locked {
                    tracing::trace!(%id, "update_node: node is locked");
                    return None;
                }
                let patch = normalize_node_patch(patch)?;
                let merged = patch.apply_to(current);
                if &merged == current {
                    return None;
                }
                working.replace_node(merged).ok()?;
                touch.touch(&id);
                Some(AppliedOp::UpdateNode { id, patch })
            }
            PatchOp::RemoveNode { id } => {
                if !self.config.allow_delete {
                    return None;
                }
                let id = NodeId::new(collapse_whitespace(id));
                if working.node(&id)?.locked {
                    tracing::trace!(%id, "remove_node: node is locked");
                    return None;
                }
                let (_, cascaded) = working.remove_node(&id)?;
                touch.forget(&id);
                tracing::trace!(%id, cascaded = cascaded.len(), "remove_node");
                Some(AppliedOp::RemoveNode { id })
            }
            PatchOp::AddEdge { edge } => {
                let edge = normalize_edge(edge)?;
                if let Err(reason) = working.insert_edge(edge.clone()) {
                    tracing::trace!(id = %edge.id, %reason, "add_edge rejected");
                    return None;
                }
                Some(AppliedOp::AddEdge { edge })
            }
            PatchOp::RemoveEdge { id } => {
                if !self.config.allow_delete {
                    return None;
                }
                let id = EdgeId::new(collapse_whitespace(id));
                working.remove_edge(&id)?;
                Some(AppliedOp::RemoveEdge { id })
            }
        }
    }
}

/// Fills in missing layers by inference. Not counted as a structural change.
fn backfill_layers(working: &mut WorkingGraph) {
    let missing: Vec<_> = working
        .nodes()
        .filter(|n| n.layer.is_none())
        .cloned()
        .collect();
    for mut node in missing {
        node.layer = Some(node.inferred_layer());
        let _ = working.replace_node(node);
    }
}

fn survives(op: &AppliedOp, working: &WorkingGraph) -> bool {
    match op {
        AppliedOp::AddNode { node } => working.contains_node(&node.id),
        AppliedOp::UpdateNode { id, .. } => working.contains_node(id),
        AppliedOp::AddEdge { edge } => working.contains_edge(&edge.id),
        AppliedOp::RemoveNode { .. } | AppliedOp::RemoveEdge { .. } => true,
    }
}

/// Applies a patch with the default classifier and rebalancer.
#[must_use]
pub fn apply_patch(graph: &IntentGraph, patch: &GraphPatch, config: &EngineConfig) -> PatchOutcome {
    let classifier = RuleClassifier::new();
    let rebalancer = HubRebalancer::new();
    PatchApplier::new(config, &classifier, &rebalancer).apply(graph, patch)
}
