//! Motif types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::concept::ConceptId;
use crate::error::ValidationError;
use crate::graph::{EdgeId, EdgeType, NodeId};
use crate::slot::SlotFamily;

/// Stable identifier of a motif, derived from its pattern signature.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotifId(String);

impl MotifId {
    /// Derives the id of the motif with `template_key`.
    #[must_use]
    pub fn for_template(template_key: &str) -> Self {
        let hash = blake3::hash(template_key.as_bytes());
        let hex = hash.to_hex();
        Self(format!("m_{}", &hex.as_str()[..24]))
    }

    /// Wraps an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MotifId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of concepts a motif spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotifType {
    Pair,
    Triad,
}

impl MotifType {
    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Triad => "triad",
        }
    }

    /// Priority bonus used when ranking motifs.
    #[must_use]
    pub const fn boost(self) -> f64 {
        match self {
            Self::Pair => 0.0,
            Self::Triad => 0.02,
        }
    }
}

/// Lifecycle status of a motif.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotifStatus {
    Active,
    Uncertain,
    Deprecated,
    Disabled,
    Cancelled,
}

impl MotifStatus {
    /// Parses a vocabulary term, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "uncertain" => Ok(Self::Uncertain),
            "deprecated" => Ok(Self::Deprecated),
            "disabled" => Ok(Self::Disabled),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ValidationError::UnknownVariant {
                vocabulary: "motif status",
                value: s.to_string(),
            }),
        }
    }

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Uncertain => "uncertain",
            Self::Deprecated => "deprecated",
            Self::Disabled => "disabled",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses a user resolution may set.
    #[must_use]
    pub const fn is_resolvable(self) -> bool {
        matches!(self, Self::Active | Self::Disabled | Self::Cancelled)
    }
}

impl fmt::Display for MotifStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a motif compares to the prior reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Novelty {
    #[default]
    New,
    Updated,
    Unchanged,
}

/// Causal reading of a motif's dependency class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CausalOperator {
    DirectCausation,
    MediatedCausation,
    Confounding,
    Intervention,
    Contradiction,
}

/// One status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub by: String,
    pub from: Option<MotifStatus>,
    pub to: MotifStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Actor recorded for transitions made by the engine itself.
pub const SYSTEM_ACTOR: &str = "system";

/// A recurring structural pattern over concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motif {
    pub id: MotifId,
    pub template_key: String,
    pub motif_type: MotifType,
    pub relation: EdgeType,
    pub dependency_class: EdgeType,
    pub causal_operator: CausalOperator,
    #[serde(default)]
    pub causal_formula: String,
    /// Source concepts first, anchor last.
    pub concept_ids: Vec<ConceptId>,
    pub anchor_concept_id: ConceptId,
    /// Families of the source concepts, sorted.
    #[serde(default)]
    pub source_families: Vec<SlotFamily>,
    pub anchor_family: SlotFamily,
    /// True if any source concept is phrased as a negation.
    #[serde(default)]
    pub negated: bool,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub confidence: f64,
    #[serde(default)]
    pub support_edge_ids: Vec<EdgeId>,
    #[serde(default)]
    pub support_node_ids: Vec<NodeId>,
    pub status: MotifStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub novelty: Novelty,
}

impl Motif {
    /// Ranking priority: confidence plus relation and type boosts.
    #[must_use]
    pub fn priority(&self) -> f64 {
        self.confidence + self.dependency_class.boost() + self.motif_type.boost()
    }

    /// Source concepts, without the anchor.
    #[must_use]
    pub fn source_concept_ids(&self) -> &[ConceptId] {
        let n = self.concept_ids.len().saturating_sub(1);
        &self.concept_ids[..n]
    }

    /// Moves to `to`, appending a history entry if status or reason changed.
    ///
    /// A motif without history always records its first entry, with no `from`.
    pub fn transition(
        &mut self,
        to: MotifStatus,
        reason: Option<String>,
        by: &str,
        at: DateTime<Utc>,
        history_cap: usize,
    ) {
        let from = if self.history.is_empty() {
            None
        } else if self.status == to && self.status_reason == reason {
            return;
        } else {
            Some(self.status)
        };
        self.history.push(HistoryEntry {
            at,
            by: by.to_string(),
            from,
            to,
            reason: reason.clone(),
        });
        if self.history.len() > history_cap {
            let excess = self.history.len() - history_cap;
            self.history.drain(..excess);
        }
        self.status = to;
        self.status_reason = reason;
    }
}
