//! Duration-outlier pruner.

use std::collections::BTreeMap;

use crate::graph::WorkingGraph;
use crate::slot::{SlotFamily, SlotValue};

use super::{prune_node, CleanupContext, CleanupPass};

/// Removes total-duration nodes that disagree with the per-city durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationOutlierPruner;

/// Returns true if a total of `days` is an outlier against `city_sum`.
#[must_use]
pub fn is_duration_outlier(days: u32, city_sum: u64) -> bool {
    let sum = city_sum as f64;
    let tolerance = ((sum * 0.35).floor() as u64).clamp(2, 5);
    let too_large = u64::from(days) > city_sum.saturating_add(tolerance) && f64::from(days) >= (sum * 1.6).ceil();
    let too_small = f64::from(days) < (sum * 0.45).floor();
    too_large || too_small
}

impl CleanupPass for DurationOutlierPruner {
    fn name(&self) -> &'static str {
        "duration_outlier"
    }

    fn run(&self, graph: &mut WorkingGraph, ctx: &CleanupContext<'_>) -> bool {
        let slots = ctx.slot_index(graph);

        // Max days per city slot, so duplicates are not double counted.
        let mut per_city: BTreeMap<&str, u32> = BTreeMap::new();
        let mut totals = Vec::new();
        for (id, slot) in &slots {
            match (slot.family, &slot.value) {
                (SlotFamily::DurationCity, SlotValue::PlaceDays { days, .. }) => {
                    let entry = per_city.entry(slot.key.as_str()).or_default();
                    *entry = (*entry).max(*days);
                }
                (SlotFamily::DurationTotal, SlotValue::TotalDays { days, .. }) => {
                    totals.push((id.clone(), *days));
                }
                _ => {}
            }
        }
        if per_city.is_empty() || totals.is_empty() {
            return false;
        }

        let city_sum = per_city.values().fold(0u64, |sum, days| sum.saturating_add(u64::from(*days)));
        let mut changed = false;
        for (id, days) in totals {
            if is_duration_outlier(days, city_sum) {
                tracing::trace!(%id, days, city_sum, "total duration is an outlier");
                changed |= prune_node(graph, &id, self.name());
            }
        }
        changed
    }
}
