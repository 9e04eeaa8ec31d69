//! Intent graph edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Identifier of an edge, unique within a graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Wraps an already-validated id string.
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

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Relation carried by an edge. Also used as the dependency class of a motif.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Enable,
    Constraint,
    Determine,
    ConflictsWith,
}

impl EdgeType {
    /// Parses a vocabulary term, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enable" => Some(Self::Enable),
            "constraint" => Some(Self::Constraint),
            "determine" => Some(Self::Determine),
            "conflicts_with" => Some(Self::ConflictsWith),
            _ => None,
        }
    }

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Constraint => "constraint",
            Self::Determine => "determine",
            Self::ConflictsWith => "conflicts_with",
        }
    }

    /// Priority bonus of a relation when ranking patterns built on it.
    #[must_use]
    pub const fn boost(self) -> f64 {
        match self {
            Self::Constraint => 0.03,
            Self::Determine => 0.02,
            Self::Enable => 0.01,
            Self::ConflictsWith => 0.0,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default confidence for an edge payload without one.
pub const DEFAULT_EDGE_CONFIDENCE: f64 = 0.6;

/// A directed, typed relation between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub confidence: f64,
}

impl Edge {
    /// Creates an edge with the default confidence.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            id: EdgeId::new(id),
            from: NodeId::new(from),
            to: NodeId::new(to),
            edge_type,
            confidence: DEFAULT_EDGE_CONFIDENCE,
        }
    }

    /// Sets the confidence (clamped).
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// The `(from, to, type)` triple that must be unique within a graph.
    #[must_use]
    pub fn signature(&self) -> EdgeSignature {
        EdgeSignature {
            from: self.from.clone(),
            to: self.to.clone(),
            edge_type: self.edge_type,
        }
    }

    /// Returns true if either endpoint is `node`.
    #[must_use]
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.from == node || &self.to == node
    }
}

/// Uniqueness key of an edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeSignature {
    pub from: NodeId,
    pub to: NodeId,
    pub edge_type: EdgeType,
}
