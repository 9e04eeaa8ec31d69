//! Invalid-structured-node pruner.

use crate::graph::WorkingGraph;
use crate::slot::is_valid_place;

use super::{prune_node, CleanupContext, CleanupPass};

/// Removes destination and city-duration nodes whose place fails validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidStructuredPruner;

impl CleanupPass for InvalidStructuredPruner {
    fn name(&self) -> &'static str {
        "invalid_structured"
    }

    fn run(&self, graph: &mut WorkingGraph, ctx: &CleanupContext<'_>) -> bool {
        let invalid: Vec<_> = ctx
            .slot_index(graph)
            .into_iter()
            .filter(|(_, slot)| slot.family.is_structured())
            .filter(|(_, slot)| {
                let place = slot
                    .value
                    .place()
                    .or_else(|| slot.key.split_once(':').map(|(_, p)| p))
                    .unwrap_or_default();
                !is_valid_place(place)
            })
            .map(|(id, _)| id)
            .collect();

        let mut changed = false;
        for id in &invalid {
            changed |= prune_node(graph, id, self.name());
        }
        changed
    }
}
