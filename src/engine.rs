//! Engine facade.
//!
//! [`IntentEngine`] bundles a validated [`EngineConfig`] with the injected
//! slot classifier and topology rebalancer, and exposes the two halves of the
//! crate: patch application on one side, concept and motif reconciliation on
//! the other. It holds no graph state between calls.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cleanup::{HubRebalancer, TopologyRebalancer};
use crate::concept::{derive_concepts, reconcile_concepts, Concept};
use crate::config::EngineConfig;
use crate::error::{IntentResult, ValidationError};
use crate::graph::IntentGraph;
use crate::ir::GraphPatch;
use crate::motif::{mine_motifs, reconcile_motifs, resolve_motif, Motif, MotifId, MotifStatus};
use crate::patch::{PatchApplier, PatchOutcome};
use crate::slot::{RuleClassifier, SlotClassifier};
use crate::summary::IntentSummary;

/// Concepts and motifs produced by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub motifs: Vec<Motif>,
}

impl Reconciliation {
    /// Builds the structured summary of this reconciliation.
    #[must_use]
    pub fn summary(&self) -> IntentSummary {
        IntentSummary::build(&self.concepts, &self.motifs)
    }

    /// Looks up a motif by id.
    #[must_use]
    pub fn motif(&self, id: &MotifId) -> Option<&Motif> {
        self.motifs.iter().find(|m| &m.id == id)
    }
}

/// Intent graph engine.
#[derive(Clone)]
pub struct IntentEngine {
    config: EngineConfig,
    classifier: Arc<dyn SlotClassifier>,
    rebalancer: Arc<dyn TopologyRebalancer>,
}

impl fmt::Debug for IntentEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IntentEngine {
    /// Creates an engine with the default rule classifier and hub rebalancer.
    pub fn new(config: EngineConfig) -> IntentResult<Self> {
        Self::with_collaborators(
            config,
            Arc::new(RuleClassifier::new()),
            Arc::new(HubRebalancer::new()),
        )
    }

    /// Creates an engine with explicit collaborators.
    pub fn with_collaborators(
        config: EngineConfig,
        classifier: Arc<dyn SlotClassifier>,
        rebalancer: Arc<dyn TopologyRebalancer>,
    ) -> IntentResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier,
            rebalancer,
        })
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Applies `patch` to `graph` and runs the cleanup passes.
    #[must_use]
    pub fn apply_patch(&self, graph: &IntentGraph, patch: &GraphPatch) -> PatchOutcome {
        PatchApplier::new(&self.config, self.classifier.as_ref(), self.rebalancer.as_ref()).apply(graph, patch)
    }

    /// Derives concepts from `graph`, without prior state.
    #[must_use]
    pub fn derive_concepts(&self, graph: &IntentGraph) -> Vec<Concept> {
        derive_concepts(graph, self.classifier.as_ref(), self.config.concept_limit)
    }

    /// Derives concepts and motifs from `graph` and reconciles them with the
    /// prior state. `now` stamps every history entry written.
    #[must_use]
    pub fn reconcile(
        &self,
        graph: &IntentGraph,
        prior_concepts: &[Concept],
        prior_motifs: &[Motif],
        now: DateTime<Utc>,
    ) -> Reconciliation {
        let span = tracing::debug_span!("reconcile", graph = %graph.id(), version = graph.version());
        let _enter = span.enter();

        let derived = self.derive_concepts(graph);
        let mut concepts = reconcile_concepts(derived, prior_concepts);
        let mined = mine_motifs(graph, &concepts);
        let motifs = reconcile_motifs(mined, prior_motifs, &concepts, &self.config.motif, now);
        attach_motif_ids(&mut concepts, &motifs);

        tracing::debug!(concepts = concepts.len(), motifs = motifs.len(), "reconciliation complete");
        Reconciliation { concepts, motifs }
    }

    /// Records a user resolution on the motif `id` within `motifs`.
    pub fn resolve_motif(
        &self,
        motifs: &mut [Motif],
        id: &MotifId,
        status: MotifStatus,
        actor: &str,
        at: DateTime<Utc>,
    ) -> IntentResult<()> {
        let motif = motifs
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| ValidationError::InvalidField {
                field: "motif_id".to_string(),
                reason: format!("unknown motif '{id}'"),
            })?;
        resolve_motif(motif, status, actor, at, self.config.motif.history_cap)?;
        tracing::debug!(motif = %id, %status, actor, "motif resolved");
        Ok(())
    }
}

/// Gives every concept the ids of the live motifs it takes part in, either
/// as a named concept or through a supporting node.
fn attach_motif_ids(concepts: &mut [Concept], motifs: &[Motif]) {
    for concept in concepts.iter_mut() {
        let mut ids: Vec<MotifId> = motifs
            .iter()
            .filter(|m| m.status != MotifStatus::Cancelled)
            .filter(|m| {
                m.concept_ids.contains(&concept.id)
                    || m.support_node_ids.iter().any(|n| concept.node_ids.contains(n))
            })
            .map(|m| m.id.clone())
            .collect();
        ids.sort();
        concept.motif_ids = ids;
    }
}
