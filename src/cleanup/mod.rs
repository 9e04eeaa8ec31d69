//! Cleanup passes run after every patch.
//!
//! Passes run in a fixed order: invalid structured nodes, duration outliers,
//! singleton-slot compaction, then topology rebalancing. Each reports whether
//! it changed the graph; any change bumps the graph version.

mod compact;
mod duration;
mod invalid;
mod rebalance;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::graph::{NodeId, WorkingGraph};
use crate::patch::TouchLog;
use crate::slot::{slot_of, SemanticSlot, SlotClassifier};

pub use compact::SlotCompactor;
pub use duration::DurationOutlierPruner;
pub use invalid::InvalidStructuredPruner;
pub use rebalance::{HubRebalancer, TopologyRebalancer};

/// Read-only inputs shared by every pass.
#[derive(Clone, Copy)]
pub struct CleanupContext<'a> {
    /// Nodes touched by the current patch.
    pub touch: &'a TouchLog,
    /// Text-to-slot classification.
    pub classifier: &'a dyn SlotClassifier,
    /// Engine configuration.
    pub config: &'a EngineConfig,
}

impl CleanupContext<'_> {
    /// Slots of every live node that has one, in insertion order.
    #[must_use]
    pub fn slot_index(&self, graph: &WorkingGraph) -> Vec<(NodeId, SemanticSlot)> {
        graph
            .nodes()
            .filter_map(|n| slot_of(n, self.classifier).map(|slot| (n.id.clone(), slot)))
            .collect()
    }
}

/// A graph cleanup pass.
pub trait CleanupPass {
    /// Stable pass name for reports and logs.
    fn name(&self) -> &'static str;

    /// Runs the pass. Returns true if the graph changed.
    fn run(&self, graph: &mut WorkingGraph, ctx: &CleanupContext<'_>) -> bool;
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassResult {
    pub pass: &'static str,
    pub changed: bool,
}

/// Outcome of the whole cleanup pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub passes: Vec<PassResult>,
}

impl CleanupReport {
    /// Returns true if any pass changed the graph.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.passes.iter().any(|p| p.changed)
    }

    /// Returns whether the named pass changed the graph.
    #[must_use]
    pub fn pass_changed(&self, pass: &str) -> bool {
        self.passes.iter().any(|p| p.pass == pass && p.changed)
    }
}

struct RebalancePass<'r>(&'r dyn TopologyRebalancer);

impl CleanupPass for RebalancePass<'_> {
    fn name(&self) -> &'static str {
        "topology_rebalance"
    }

    fn run(&self, graph: &mut WorkingGraph, ctx: &CleanupContext<'_>) -> bool {
        self.0.rebalance(graph, ctx)
    }
}

/// Runs every pass in order and collects the report.
pub fn run_passes(
    graph: &mut WorkingGraph,
    ctx: &CleanupContext<'_>,
    rebalancer: &dyn TopologyRebalancer,
) -> CleanupReport {
    let rebalance = RebalancePass(rebalancer);
    let passes: [&dyn CleanupPass; 4] = [
        &InvalidStructuredPruner,
        &DurationOutlierPruner,
        &SlotCompactor,
        &rebalance,
    ];

    let mut report = CleanupReport::default();
    for pass in passes {
        let changed = pass.run(graph, ctx);
        tracing::debug!(pass = pass.name(), changed, "cleanup pass");
        report.passes.push(PassResult {
            pass: pass.name(),
            changed,
        });
    }
    report
}

/// Removes an unlocked node and its edges. Returns true if removed.
pub(crate) fn prune_node(graph: &mut WorkingGraph, id: &NodeId, pass: &'static str) -> bool {
    if graph.node(id).is_some_and(|n| n.locked) {
        return false;
    }
    match graph.remove_node(id) {
        Some((_, cascaded)) => {
            tracing::trace!(pass, %id, cascaded = cascaded.len(), "node pruned");
            true
        }
        None => false,
    }
}
