//! Concept types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::motif::MotifId;
use crate::slot::SlotFamily;

/// Stable identifier of a concept, derived from its semantic key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptId(String);

impl ConceptId {
    /// Derives the id of the concept with `semantic_key`.
    #[must_use]
    pub fn for_key(semantic_key: &str) -> Self {
        let hash = blake3::hash(semantic_key.as_bytes());
        let hex = hash.to_hex();
        Self(format!("c_{}", &hex.as_str()[..24]))
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

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What role a concept plays in the user's intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptKind {
    Goal,
    Requirement,
    Risk,
    Preference,
    FactualAssertion,
}

impl ConceptKind {
    /// Sort priority; lower sorts first.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Goal => 0,
            Self::Requirement => 1,
            Self::Risk => 2,
            Self::Preference => 3,
            Self::FactualAssertion => 4,
        }
    }

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Requirement => "requirement",
            Self::Risk => "risk",
            Self::Preference => "preference",
            Self::FactualAssertion => "factual_assertion",
        }
    }
}

impl fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical representative of one semantic slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: ConceptId,
    pub kind: ConceptKind,
    pub family: SlotFamily,
    pub semantic_key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub score: f64,
    /// Member nodes, primary first.
    pub node_ids: Vec<NodeId>,
    pub primary_node_id: NodeId,
    #[serde(default)]
    pub evidence_terms: Vec<String>,
    #[serde(default)]
    pub source_msg_ids: Vec<String>,
    #[serde(default)]
    pub motif_ids: Vec<MotifId>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub paused: bool,
}

impl Concept {
    /// Returns true if `node` belongs to this concept.
    #[must_use]
    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.node_ids.contains(node)
    }
}
