//! Motif lifecycle.
//!
//! Freshly mined motifs are reconciled against the prior motif set: statuses
//! are assigned, user resolutions are honoured, and four passes prune
//! conflicting, redundant, subsumed and excess motifs. Prior motifs that are no
//! longer mined are cancelled. Every status transition lands in the history.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::concept::{Concept, ConceptId};
use crate::config::MotifConfig;
use crate::error::ValidationError;
use crate::graph::EdgeType;
use crate::slot::SlotFamily;

use super::types::{Motif, MotifStatus, MotifType, Novelty, SYSTEM_ACTOR};

/// Reason recorded for motifs on a `conflicts_with` relation.
pub const REASON_RELATION_CONFLICTS: &str = "relation_conflicts_with";
/// Reason recorded when every concept of a motif is paused.
pub const REASON_ALL_PAUSED: &str = "all_concepts_paused";
/// Reason recorded for motifs below the active threshold.
pub const REASON_LOW_CONFIDENCE: &str = "low_confidence";
/// Reason recorded for prior motifs the graph no longer supports.
pub const REASON_NOT_SUPPORTED: &str = "not_supported_by_current_graph";

struct Entry<'p> {
    motif: Motif,
    status: MotifStatus,
    reason: Option<String>,
    prior: Option<&'p Motif>,
}

impl Entry<'_> {
    fn in_play(&self) -> bool {
        !self.motif.resolved && matches!(self.status, MotifStatus::Active | MotifStatus::Uncertain)
    }

    fn deprecate(&mut self, reason: String) {
        tracing::trace!(motif = %self.motif.id, %reason, "motif deprecated");
        self.status = MotifStatus::Deprecated;
        self.reason = Some(reason);
    }
}

fn initial_status(
    motif: &mut Motif,
    prior: Option<&Motif>,
    paused: &HashSet<&ConceptId>,
    config: &MotifConfig,
) -> (MotifStatus, Option<String>) {
    if let Some(prior) = prior {
        motif.status = prior.status;
        motif.status_reason = prior.status_reason.clone();
        motif.history = prior.history.clone();
        motif.resolved = prior.resolved;
        motif.resolved_by = prior.resolved_by.clone();
    }

    if motif.dependency_class == EdgeType::ConflictsWith {
        motif.resolved = false;
        motif.resolved_by = None;
        return (MotifStatus::Deprecated, Some(REASON_RELATION_CONFLICTS.to_string()));
    }
    if motif.resolved && prior.is_some() && motif.status.is_resolvable() {
        return (motif.status, motif.status_reason.clone());
    }
    motif.resolved = false;
    motif.resolved_by = None;

    if !motif.concept_ids.is_empty() && motif.concept_ids.iter().all(|id| paused.contains(id)) {
        return (MotifStatus::Disabled, Some(REASON_ALL_PAUSED.to_string()));
    }
    if motif.confidence < config.active_threshold {
        return (MotifStatus::Uncertain, Some(REASON_LOW_CONFIDENCE.to_string()));
    }
    (MotifStatus::Active, None)
}

fn shares_family(a: &[SlotFamily], b: &[SlotFamily]) -> bool {
    a.iter().any(|f| b.contains(f))
}

/// True if two motifs on the same anchor pull in incompatible directions.
fn relation_conflict(a: &Motif, b: &Motif) -> bool {
    if a.anchor_concept_id != b.anchor_concept_id || a.dependency_class == b.dependency_class {
        return false;
    }
    let classes = [a.dependency_class, b.dependency_class];
    let has_constraint = classes.contains(&EdgeType::Constraint);
    let has_driver = classes.contains(&EdgeType::Enable) || classes.contains(&EdgeType::Determine);
    has_constraint
        && has_driver
        && (shares_family(&a.source_families, &b.source_families) || a.negated != b.negated)
}

fn relation_conflict_pass(entries: &mut [Entry<'_>], order: &[usize]) {
    for (pos, &i) in order.iter().enumerate() {
        if !entries[i].in_play() {
            continue;
        }
        for &j in &order[pos + 1..] {
            if entries[j].in_play() && relation_conflict(&entries[i].motif, &entries[j].motif) {
                let reason = format!("relation_conflict_with:{}", entries[i].motif.id);
                entries[j].deprecate(reason);
            }
        }
    }
}

fn redundancy_pass(entries: &mut [Entry<'_>], order: &[usize]) {
    let mut winners: HashMap<(EdgeType, ConceptId, BTreeSet<SlotFamily>), usize> = HashMap::new();
    for &i in order {
        if !entries[i].in_play() {
            continue;
        }
        let motif = &entries[i].motif;
        let key = (
            motif.dependency_class,
            motif.anchor_concept_id.clone(),
            motif.source_families.iter().copied().collect(),
        );
        let winner = *winners.entry(key).or_insert(i);
        if winner != i {
            let reason = format!("redundant_with:{}", entries[winner].motif.id);
            entries[i].deprecate(reason);
        }
    }
}

fn subsumption_pass(entries: &mut [Entry<'_>], order: &[usize], margin: f64) {
    for &i in order {
        if !entries[i].in_play() || entries[i].motif.motif_type != MotifType::Pair {
            continue;
        }
        let pair = &entries[i].motif;
        let triad = order.iter().copied().find(|&t| {
            let candidate = &entries[t].motif;
            entries[t].in_play()
                && candidate.motif_type == MotifType::Triad
                && candidate.anchor_concept_id == pair.anchor_concept_id
                && candidate.dependency_class == pair.dependency_class
                && pair.source_families.iter().all(|f| candidate.source_families.contains(f))
                && (candidate.confidence - pair.confidence).abs() <= margin
        });
        if let Some(t) = triad {
            let reason = format!("subsumed_by:{}", entries[t].motif.id);
            entries[i].deprecate(reason);
        }
    }
}

fn density_pass(entries: &mut [Entry<'_>], order: &[usize], cap: usize) {
    let mut active: BTreeMap<ConceptId, usize> = BTreeMap::new();
    for &i in order {
        if !entries[i].in_play() || entries[i].status != MotifStatus::Active {
            continue;
        }
        let count = active.entry(entries[i].motif.anchor_concept_id.clone()).or_default();
        *count += 1;
        if *count > cap {
            entries[i].deprecate(format!("density_pruned:max_{cap}"));
        }
    }
}

fn novelty(motif: &Motif, prior: Option<&Motif>) -> Novelty {
    let Some(prior) = prior else {
        return Novelty::New;
    };
    let same = motif.status == prior.status
        && motif.status_reason == prior.status_reason
        && (motif.confidence - prior.confidence).abs() < 1e-9
        && motif.concept_ids == prior.concept_ids
        && motif.support_edge_ids == prior.support_edge_ids;
    if same {
        Novelty::Unchanged
    } else {
        Novelty::Updated
    }
}

/// Orders motifs by priority (descending), then id.
pub fn sort_motifs(motifs: &mut [Motif]) {
    motifs.sort_by(|a, b| b.priority().total_cmp(&a.priority()).then_with(|| a.id.cmp(&b.id)));
}

/// Reconciles freshly mined motifs against the prior motif set.
#[must_use]
pub fn reconcile_motifs(
    derived: Vec<Motif>,
    prior: &[Motif],
    concepts: &[Concept],
    config: &MotifConfig,
    now: DateTime<Utc>,
) -> Vec<Motif> {
    let prior_by_id: HashMap<_, _> = prior.iter().map(|m| (&m.id, m)).collect();
    let paused: HashSet<&ConceptId> = concepts.iter().filter(|c| c.paused).map(|c| &c.id).collect();
    let derived_ids: HashSet<_> = derived.iter().map(|m| m.id.clone()).collect();

    let mut entries: Vec<Entry<'_>> = derived
        .into_iter()
        .map(|mut motif| {
            let previous = prior_by_id.get(&motif.id).copied();
            let (status, reason) = initial_status(&mut motif, previous, &paused, config);
            Entry {
                motif,
                status,
                reason,
                prior: previous,
            }
        })
        .collect();

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&entries[a].motif, &entries[b].motif);
        b.priority().total_cmp(&a.priority()).then_with(|| a.id.cmp(&b.id))
    });

    relation_conflict_pass(&mut entries, &order);
    redundancy_pass(&mut entries, &order);
    subsumption_pass(&mut entries, &order, config.subsumption_margin);
    density_pass(&mut entries, &order, config.max_active_per_anchor);

    let mut motifs: Vec<Motif> = Vec::with_capacity(entries.len() + prior.len());
    for entry in entries {
        let Entry {
            mut motif,
            status,
            reason,
            prior,
        } = entry;
        motif.transition(status, reason, SYSTEM_ACTOR, now, config.history_cap);
        motif.novelty = novelty(&motif, prior);
        motifs.push(motif);
    }

    let mut cancelled = 0usize;
    for previous in prior.iter().filter(|m| !derived_ids.contains(&m.id)) {
        let mut motif = previous.clone();
        let user_cancelled = motif.resolved && motif.status == MotifStatus::Cancelled;
        if !user_cancelled {
            motif.resolved = false;
            motif.resolved_by = None;
            motif.transition(
                MotifStatus::Cancelled,
                Some(REASON_NOT_SUPPORTED.to_string()),
                SYSTEM_ACTOR,
                now,
                config.history_cap,
            );
        }
        motif.novelty = novelty(&motif, Some(previous));
        if motif.novelty == Novelty::Updated {
            cancelled += 1;
        }
        motifs.push(motif);
    }

    sort_motifs(&mut motifs);
    tracing::debug!(motifs = motifs.len(), cancelled, "motifs reconciled");
    motifs
}

/// Records a user resolution of `motif`.
///
/// Only `active`, `disabled` and `cancelled` can be chosen by a user; the
/// resolution then survives later reconciliations until the motif's relation
/// becomes `conflicts_with`.
pub fn resolve_motif(
    motif: &mut Motif,
    status: MotifStatus,
    actor: &str,
    at: DateTime<Utc>,
    history_cap: usize,
) -> Result<(), ValidationError> {
    if !status.is_resolvable() {
        return Err(ValidationError::InvalidResolution {
            status: status.to_string(),
        });
    }
    let actor = actor.trim();
    if actor.is_empty() {
        return Err(ValidationError::MissingField {
            field: "actor".to_string(),
        });
    }
    motif.transition(status, Some(format!("resolved_by:{actor}")), actor, at, history_cap);
    motif.resolved = true;
    motif.resolved_by = Some(actor.to_string());
    Ok(())
}
