//! Intent graph nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node, unique within a graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
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

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The kind of claim a node makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Goal,
    Constraint,
    Preference,
    Belief,
    Fact,
    Question,
}

impl NodeType {
    /// Parses a vocabulary term, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "goal" => Some(Self::Goal),
            "constraint" => Some(Self::Constraint),
            "preference" => Some(Self::Preference),
            "belief" => Some(Self::Belief),
            "fact" => Some(Self::Fact),
            "question" => Some(Self::Question),
            _ => None,
        }
    }

    /// Confidence assumed when a payload carries none.
    #[must_use]
    pub const fn default_confidence(self) -> f64 {
        match self {
            Self::Goal => 0.7,
            Self::Constraint => 0.75,
            Self::Preference => 0.65,
            Self::Belief => 0.6,
            Self::Fact => 0.8,
            Self::Question => 0.5,
        }
    }

    /// Stable snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Constraint => "constraint",
            Self::Preference => "preference",
            Self::Belief => "belief",
            Self::Fact => "fact",
            Self::Question => "question",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Proposed,
    Confirmed,
    Rejected,
    Disputed,
}

impl NodeStatus {
    /// Parses a vocabulary term, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proposed" => Some(Self::Proposed),
            "confirmed" => Some(Self::Confirmed),
            "rejected" => Some(Self::Rejected),
            "disputed" => Some(Self::Disputed),
            _ => None,
        }
    }
}

/// Strength of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Hard,
    Soft,
}

impl Strength {
    /// Parses a vocabulary term, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" => Some(Self::Hard),
            "soft" => Some(Self::Soft),
            _ => None,
        }
    }
}

/// Severity attached to risk-like claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parses a vocabulary term, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Coarse classification of a node within the intent hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLayer {
    Intent,
    Requirement,
    Preference,
    Risk,
}

impl NodeLayer {
    /// Parses a vocabulary term, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intent" => Some(Self::Intent),
            "requirement" => Some(Self::Requirement),
            "preference" => Some(Self::Preference),
            "risk" => Some(Self::Risk),
            _ => None,
        }
    }
}

const RISK_MARKERS: &[&str] = &[
    "risk", "health", "medical", "safety", "legal", "visa", "allergy", "insurance", "injury",
    "风险", "健康", "医疗", "安全", "法律", "签证", "过敏", "保险", "病",
];

const PREFERENCE_MARKERS: &[&str] = &[
    "prefer", "would like", "ideally", "love", "喜欢", "偏好", "希望", "想要", "最好",
];

/// A claim in the intent graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<NodeLayer>,

    pub statement: String,

    #[serde(default)]
    pub status: NodeStatus,

    pub confidence: f64,

    /// Only meaningful for constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<Strength>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub locked: bool,

    /// Optional semantic-slot identifier supplied by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_msg_ids: Vec<String>,
}

impl Node {
    /// Creates a proposed node with the type's default confidence.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: NodeType, statement: impl Into<String>) -> Self {
        let mut node = Self {
            id: NodeId::new(id),
            node_type,
            layer: None,
            statement: statement.into(),
            status: NodeStatus::Proposed,
            confidence: node_type.default_confidence(),
            strength: None,
            severity: None,
            importance: None,
            tags: Vec::new(),
            locked: false,
            key: None,
            evidence_ids: Vec::new(),
            source_msg_ids: Vec::new(),
        };
        node.layer = Some(node.inferred_layer());
        node
    }

    /// Sets the confidence (clamped).
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the importance (clamped).
    #[must_use]
    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = Some(importance.clamp(0.0, 1.0));
        self
    }

    /// Marks the node as locked.
    #[must_use]
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Sets the explicit semantic-slot key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the constraint strength; ignored for other node types.
    #[must_use]
    pub fn with_strength(mut self, strength: Strength) -> Self {
        if self.node_type == NodeType::Constraint {
            self.strength = Some(strength);
            self.layer = Some(self.inferred_layer());
        }
        self
    }

    /// Returns true if the node is confirmed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.status == NodeStatus::Confirmed
    }

    /// Infers the layer from type, statement, strength, severity, importance, tags and lock state.
    #[must_use]
    pub fn inferred_layer(&self) -> NodeLayer {
        if self.node_type == NodeType::Goal {
            return NodeLayer::Intent;
        }

        let text = self.statement.to_lowercase();
        let tagged = |needle: &str| self.tags.iter().any(|t| t.eq_ignore_ascii_case(needle));

        if matches!(self.severity, Some(Severity::High | Severity::Critical))
            || tagged("risk")
            || RISK_MARKERS.iter().any(|m| text.contains(m))
        {
            return NodeLayer::Risk;
        }

        match self.node_type {
            NodeType::Constraint => NodeLayer::Requirement,
            NodeType::Preference => {
                if self.locked || self.importance.is_some_and(|i| i >= 0.85) {
                    NodeLayer::Requirement
                } else {
                    NodeLayer::Preference
                }
            }
            NodeType::Belief => {
                if tagged("preference") || PREFERENCE_MARKERS.iter().any(|m| text.contains(m)) {
                    NodeLayer::Preference
                } else {
                    NodeLayer::Requirement
                }
            }
            NodeType::Fact | NodeType::Question => {
                if self.locked || self.importance.is_some_and(|i| i >= 0.75) || tagged("requirement")
                {
                    NodeLayer::Requirement
                } else if PREFERENCE_MARKERS.iter().any(|m| text.contains(m)) {
                    NodeLayer::Preference
                } else {
                    NodeLayer::Requirement
                }
            }
            NodeType::Goal => NodeLayer::Intent,
        }
    }
}
