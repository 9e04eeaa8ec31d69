//! Carrying user-owned concept state across derivations.

use std::collections::HashMap;

use super::derive::MAX_EVIDENCE_TERMS;
use super::types::Concept;

/// Merges prior concept state into freshly derived concepts.
///
/// A prior concept matches by id first, then by semantic key. Matched concepts
/// keep the prior `locked` and `paused` flags (locks are never lost) and
/// accumulate evidence terms and source messages. Prior concepts with no
/// derived counterpart are dropped.
#[must_use]
pub fn reconcile_concepts(derived: Vec<Concept>, prior: &[Concept]) -> Vec<Concept> {
    let by_id: HashMap<_, _> = prior.iter().map(|c| (&c.id, c)).collect();
    let by_key: HashMap<_, _> = prior.iter().map(|c| (c.semantic_key.as_str(), c)).collect();

    derived
        .into_iter()
        .map(|mut concept| {
            let Some(previous) = by_id
                .get(&concept.id)
                .or_else(|| by_key.get(concept.semantic_key.as_str()))
            else {
                return concept;
            };
            concept.locked |= previous.locked;
            concept.paused = previous.paused;
            for term in &previous.evidence_terms {
                if concept.evidence_terms.len() >= MAX_EVIDENCE_TERMS {
                    break;
                }
                if !concept.evidence_terms.contains(term) {
                    concept.evidence_terms.push(term.clone());
                }
            }
            for msg in &previous.source_msg_ids {
                if !concept.source_msg_ids.contains(msg) {
                    concept.source_msg_ids.push(msg.clone());
                }
            }
            concept
        })
        .collect()
}
