//! Structured intent summary.
//!
//! A compact view over reconciled concepts and motifs: what the user wants,
//! what binds it, which patterns hold, and which ones need a clarifying
//! question. No phrasing happens here; renderers turn this into text.

use serde::{Deserialize, Serialize};

use crate::concept::{Concept, ConceptId, ConceptKind};
use crate::motif::{CausalOperator, Motif, MotifId, MotifStatus};
use crate::slot::SlotFamily;

/// Maximum number of clarification candidates.
pub const MAX_CLARIFICATIONS: usize = 6;

/// One concept line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    pub concept_id: ConceptId,
    pub family: SlotFamily,
    pub title: String,
    pub score: f64,
    pub locked: bool,
}

impl From<&Concept> for SummaryItem {
    fn from(concept: &Concept) -> Self {
        Self {
            concept_id: concept.id.clone(),
            family: concept.family,
            title: concept.title.clone(),
            score: concept.score,
            locked: concept.locked,
        }
    }
}

/// One active motif line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotifLine {
    pub motif_id: MotifId,
    pub operator: CausalOperator,
    pub formula: String,
    pub confidence: f64,
}

/// Why a clarification is suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationKind {
    UncertainMotif,
    RelationConflict,
}

/// A motif the user should be asked about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clarification {
    pub kind: ClarificationKind,
    pub motif_id: MotifId,
    /// The motif this one lost to, for relation conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub against: Option<MotifId>,
    pub concept_ids: Vec<ConceptId>,
    pub confidence: f64,
}

/// Summary of the current intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSummary {
    pub goal: Option<SummaryItem>,
    pub requirements: Vec<SummaryItem>,
    pub risks: Vec<SummaryItem>,
    pub preferences: Vec<SummaryItem>,
    pub facts: Vec<SummaryItem>,
    pub active_motifs: Vec<MotifLine>,
    pub clarifications: Vec<Clarification>,
}

impl IntentSummary {
    /// Builds the summary. Paused concepts are left out; concepts keep their
    /// incoming order, motifs are listed by priority.
    #[must_use]
    pub fn build(concepts: &[Concept], motifs: &[Motif]) -> Self {
        let mut summary = Self::default();
        for concept in concepts.iter().filter(|c| !c.paused) {
            let item = SummaryItem::from(concept);
            match concept.kind {
                ConceptKind::Goal if summary.goal.is_none() => summary.goal = Some(item),
                ConceptKind::Goal | ConceptKind::Requirement => summary.requirements.push(item),
                ConceptKind::Risk => summary.risks.push(item),
                ConceptKind::Preference => summary.preferences.push(item),
                ConceptKind::FactualAssertion => summary.facts.push(item),
            }
        }

        let mut ranked: Vec<&Motif> = motifs.iter().collect();
        ranked.sort_by(|a, b| b.priority().total_cmp(&a.priority()).then_with(|| a.id.cmp(&b.id)));

        summary.active_motifs = ranked
            .iter()
            .filter(|m| m.status == MotifStatus::Active)
            .map(|m| MotifLine {
                motif_id: m.id.clone(),
                operator: m.causal_operator,
                formula: m.causal_formula.clone(),
                confidence: m.confidence,
            })
            .collect();

        summary.clarifications = ranked
            .iter()
            .filter_map(|m| clarification(m))
            .take(MAX_CLARIFICATIONS)
            .collect();
        summary
    }
}

fn clarification(motif: &Motif) -> Option<Clarification> {
    if motif.resolved {
        return None;
    }
    let (kind, against) = match (motif.status, motif.status_reason.as_deref()) {
        (MotifStatus::Uncertain, _) => (ClarificationKind::UncertainMotif, None),
        (MotifStatus::Deprecated, Some(reason)) => {
            let winner = reason.strip_prefix("relation_conflict_with:")?;
            (ClarificationKind::RelationConflict, Some(MotifId::new(winner)))
        }
        _ => return None,
    };
    Some(Clarification {
        kind,
        motif_id: motif.id.clone(),
        against,
        concept_ids: motif.concept_ids.clone(),
        confidence: motif.confidence,
    })
}
