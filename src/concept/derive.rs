//! Concept derivation.
//!
//! One concept per semantic slot of the consistent graph. Near-duplicate
//! concepts of the same kind and family are then merged by text similarity.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::graph::{IntentGraph, Node, NodeLayer, NodeStatus, NodeType};
use crate::slot::{normalize_text, slot_key, slot_of, SemanticSlot, SlotClassifier, SlotFamily, SlotValue};

use super::similarity::is_near_duplicate;
use super::types::{Concept, ConceptId, ConceptKind};

/// Maximum number of evidence terms kept on a concept.
pub const MAX_EVIDENCE_TERMS: usize = 24;

/// Weighted score of a node, in `[0, 1]`.
#[must_use]
pub fn node_score(node: &Node) -> f64 {
    let importance = node.importance.unwrap_or(0.5);
    let confirmed = if node.is_confirmed() { 1.0 } else { 0.0 };
    let locked = if node.locked { 1.0 } else { 0.0 };
    (0.55 * node.confidence + 0.25 * importance + 0.15 * confirmed + 0.05 * locked).clamp(0.0, 1.0)
}

fn compare_primary(a: &Node, b: &Node) -> Ordering {
    a.locked
        .cmp(&b.locked)
        .then_with(|| a.is_confirmed().cmp(&b.is_confirmed()))
        .then_with(|| node_score(a).total_cmp(&node_score(b)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Maps a primary node and its slot family to a concept kind.
#[must_use]
pub fn concept_kind(node: &Node, family: SlotFamily) -> ConceptKind {
    let layer = node.layer.unwrap_or_else(|| node.inferred_layer());
    if node.node_type == NodeType::Goal || family == SlotFamily::Goal {
        return ConceptKind::Goal;
    }
    if matches!(
        family,
        SlotFamily::DurationTotal
            | SlotFamily::DurationCity
            | SlotFamily::Budget
            | SlotFamily::BudgetRemaining
            | SlotFamily::People
            | SlotFamily::Destination
            | SlotFamily::Date
    ) {
        return ConceptKind::Requirement;
    }
    if family == SlotFamily::LimitingFactor || layer == NodeLayer::Risk {
        return ConceptKind::Risk;
    }
    if node.node_type == NodeType::Preference
        || layer == NodeLayer::Preference
        || family == SlotFamily::Preference
    {
        return ConceptKind::Preference;
    }
    if node.node_type == NodeType::Constraint {
        return ConceptKind::Requirement;
    }
    ConceptKind::FactualAssertion
}

fn push_unique(into: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !item.is_empty() && !into.contains(&item) {
            into.push(item);
        }
    }
}

fn build_concept(key: &str, family: SlotFamily, mut members: Vec<&Node>) -> Option<Concept> {
    members.sort_by(|a, b| compare_primary(b, a));
    let primary = *members.first()?;
    let kind = concept_kind(primary, family);

    let mut evidence_terms = Vec::new();
    let mut source_msg_ids = Vec::new();
    let mut statements = Vec::new();
    for node in &members {
        push_unique(&mut evidence_terms, [normalize_text(&node.statement)]);
        push_unique(&mut evidence_terms, node.evidence_ids.iter().cloned());
        push_unique(&mut source_msg_ids, node.source_msg_ids.iter().cloned());
        push_unique(&mut statements, [node.statement.trim().to_string()]);
    }
    evidence_terms.truncate(MAX_EVIDENCE_TERMS);

    Some(Concept {
        id: ConceptId::for_key(key),
        kind,
        family,
        semantic_key: key.to_string(),
        title: primary.statement.trim().to_string(),
        description: statements.join(" | "),
        score: node_score(primary),
        node_ids: members.iter().map(|n| n.id.clone()).collect(),
        primary_node_id: primary.id.clone(),
        evidence_terms,
        source_msg_ids,
        motif_ids: Vec::new(),
        locked: members.iter().any(|n| n.locked),
        paused: false,
    })
}

fn absorb(keeper: &mut Concept, other: Concept) {
    for id in other.node_ids {
        if !keeper.node_ids.contains(&id) {
            keeper.node_ids.push(id);
        }
    }
    push_unique(&mut keeper.evidence_terms, other.evidence_terms);
    keeper.evidence_terms.truncate(MAX_EVIDENCE_TERMS);
    push_unique(&mut keeper.source_msg_ids, other.source_msg_ids);
    if !other.description.is_empty() && !keeper.description.contains(&other.description) {
        keeper.description = format!("{} | {}", keeper.description, other.description);
    }
    keeper.locked |= other.locked;
}

/// Orders concepts by kind priority, then score (descending), then id.
pub fn sort_concepts(concepts: &mut [Concept]) {
    concepts.sort_by(|a, b| {
        a.kind
            .priority()
            .cmp(&b.kind.priority())
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Derives the concepts of `graph`, at most `limit` of them.
#[must_use]
pub fn derive_concepts(graph: &IntentGraph, classifier: &dyn SlotClassifier, limit: usize) -> Vec<Concept> {
    let mut slots: BTreeMap<String, (SlotFamily, Vec<&Node>)> = BTreeMap::new();
    for node in graph.nodes() {
        if node.status == NodeStatus::Rejected && !node.locked {
            continue;
        }
        let slot = slot_of(node, classifier).unwrap_or_else(|| {
            SemanticSlot::new(
                slot_key(SlotFamily::Generic, &node.statement),
                SlotFamily::Generic,
                SlotValue::None,
            )
        });
        slots
            .entry(slot.key)
            .or_insert_with(|| (slot.family, Vec::new()))
            .1
            .push(node);
    }

    let mut candidates: Vec<Concept> = slots
        .iter()
        .filter_map(|(key, (family, members))| build_concept(key, *family, members.clone()))
        .collect();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

    let mut merged: Vec<Concept> = Vec::with_capacity(candidates.len());
    for concept in candidates {
        let target = if concept.family.never_merges() {
            None
        } else {
            merged.iter().position(|kept| {
                kept.kind == concept.kind
                    && kept.family == concept.family
                    && is_near_duplicate(&kept.title, &concept.title, concept.family)
            })
        };
        match target {
            Some(index) => {
                tracing::trace!(keeper = %merged[index].id, merged = %concept.id, "near-duplicate concept merged");
                absorb(&mut merged[index], concept);
            }
            None => merged.push(concept),
        }
    }

    sort_concepts(&mut merged);
    if merged.len() > limit {
        tracing::debug!(derived = merged.len(), limit, "concept list truncated");
        merged.truncate(limit);
    }
    merged
}
