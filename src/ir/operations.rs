//! Patch operation definitions and payloads.
//!
//! Incoming patches carry *raw* payloads: every field is optional and loosely
//! typed, because patches are produced by upstream generators whose output is
//! not trusted. The normalizer turns raw payloads into typed [`Node`]/[`Edge`]
//! values. Applied patches carry the normalized payloads.

use serde::{Deserialize, Serialize};

use crate::graph::{
    Edge, EdgeId, Node, NodeId, NodeLayer, NodeStatus, NodeType, Severity, Strength,
};

/// Raw node payload, as produced upstream. Also used for partial updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Number or numeric string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Number or numeric string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_msg_ids: Option<Vec<String>>,
}

impl RawNode {
    /// Convenience constructor for the three required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            node_type: Some(node_type.into()),
            statement: Some(statement.into()),
            ..Self::default()
        }
    }

    /// Sets the raw confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(serde_json::Value::from(confidence));
        self
    }

    /// Sets the raw status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

impl From<&Node> for RawNode {
    fn from(node: &Node) -> Self {
        Self {
            id: Some(node.id.to_string()),
            node_type: Some(node.node_type.as_str().to_string()),
            layer: node.layer.map(layer_name),
            statement: Some(node.statement.clone()),
            status: Some(status_name(node.status)),
            confidence: Some(serde_json::Value::from(node.confidence)),
            strength: node.strength.map(strength_name),
            severity: node.severity.map(severity_name),
            importance: node.importance.map(serde_json::Value::from),
            tags: Some(node.tags.clone()),
            locked: Some(node.locked),
            key: node.key.clone(),
            evidence_ids: Some(node.evidence_ids.clone()),
            source_msg_ids: Some(node.source_msg_ids.clone()),
        }
    }
}

impl From<&NodePatch> for RawNode {
    fn from(patch: &NodePatch) -> Self {
        Self {
            id: None,
            node_type: patch.node_type.map(|t| t.as_str().to_string()),
            layer: patch.layer.map(layer_name),
            statement: patch.statement.clone(),
            status: patch.status.map(status_name),
            confidence: patch.confidence.map(serde_json::Value::from),
            strength: patch.strength.map(strength_name),
            severity: patch.severity.map(severity_name),
            importance: patch.importance.map(serde_json::Value::from),
            tags: patch.tags.clone(),
            locked: patch.locked,
            key: patch.key.clone(),
            evidence_ids: patch.evidence_ids.clone(),
            source_msg_ids: patch.source_msg_ids.clone(),
        }
    }
}

fn enum_name<T: Serialize>(value: T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn layer_name(layer: NodeLayer) -> String {
    enum_name(layer)
}

fn status_name(status: NodeStatus) -> String {
    enum_name(status)
}

fn strength_name(strength: Strength) -> String {
    enum_name(strength)
}

fn severity_name(severity: Severity) -> String {
    enum_name(severity)
}

/// Raw edge payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,

    /// Number or numeric string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<serde_json::Value>,
}

impl RawEdge {
    /// Convenience constructor.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            from: Some(from.into()),
            to: Some(to.into()),
            edge_type: Some(edge_type.into()),
            confidence: None,
        }
    }

    /// Sets the raw confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(serde_json::Value::from(confidence));
        self
    }
}

impl From<&Edge> for RawEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            id: Some(edge.id.to_string()),
            from: Some(edge.from.to_string()),
            to: Some(edge.to.to_string()),
            edge_type: Some(edge.edge_type.as_str().to_string()),
            confidence: Some(serde_json::Value::from(edge.confidence)),
        }
    }
}

/// One incoming graph operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// Add a node.
    AddNode { node: RawNode },

    /// Merge a partial node onto an existing node.
    UpdateNode { id: String, patch: RawNode },

    /// Remove a node and its edges.
    RemoveNode { id: String },

    /// Add an edge.
    AddEdge { edge: RawEdge },

    /// Remove an edge.
    RemoveEdge { id: String },
}

impl PatchOp {
    /// Stable snake_case op name, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::UpdateNode { .. } => "update_node",
            Self::RemoveNode { .. } => "remove_node",
            Self::AddEdge { .. } => "add_edge",
            Self::RemoveEdge { .. } => "remove_edge",
        }
    }
}

/// An ordered list of operations plus free-form notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LenientPatch")]
pub struct GraphPatch {
    pub ops: Vec<PatchOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl GraphPatch {
    /// Creates a patch from ops.
    #[must_use]
    pub fn new(ops: Vec<PatchOp>) -> Self {
        Self {
            ops,
            notes: Vec::new(),
        }
    }

    /// Appends an op.
    #[must_use]
    pub fn with_op(mut self, op: PatchOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Appends a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Returns true if the patch carries no ops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Wire shape accepted for patches: ops that do not decode are dropped, not fatal.
#[derive(Debug, Deserialize)]
struct LenientPatch {
    #[serde(default)]
    ops: Vec<serde_json::Value>,
    #[serde(default)]
    notes: Vec<serde_json::Value>,
}

impl From<LenientPatch> for GraphPatch {
    fn from(raw: LenientPatch) -> Self {
        let ops = raw
            .ops
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<PatchOp>(value) {
                Ok(op) => Some(op),
                Err(e) => {
                    tracing::debug!(index, error = %e, "dropping undecodable patch op");
                    None
                }
            })
            .collect();
        let notes = raw
            .notes
            .into_iter()
            .filter_map(|n| match n {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect();
        Self { ops, notes }
    }
}

/// Normalized partial node update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<NodeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<NodeLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<Strength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_msg_ids: Option<Vec<String>>,
}

impl NodePatch {
    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the patch onto `node`, re-inferring the layer unless the patch sets it.
    #[must_use]
    pub fn apply_to(&self, node: &Node) -> Node {
        let mut merged = node.clone();
        if let Some(t) = self.node_type {
            merged.node_type = t;
        }
        if let Some(s) = &self.statement {
            merged.statement = s.clone();
        }
        if let Some(s) = self.status {
            merged.status = s;
        }
        if let Some(c) = self.confidence {
            merged.confidence = c;
        }
        if self.strength.is_some() {
            merged.strength = self.strength;
        }
        if self.severity.is_some() {
            merged.severity = self.severity;
        }
        if self.importance.is_some() {
            merged.importance = self.importance;
        }
        if let Some(tags) = &self.tags {
            merged.tags = tags.clone();
        }
        if let Some(locked) = self.locked {
            merged.locked = locked;
        }
        if self.key.is_some() {
            merged.key = self.key.clone();
        }
        if let Some(ids) = &self.evidence_ids {
            merged.evidence_ids = ids.clone();
        }
        if let Some(ids) = &self.source_msg_ids {
            merged.source_msg_ids = ids.clone();
        }
        if merged.node_type != NodeType::Constraint {
            merged.strength = None;
        }
        merged.layer = Some(self.layer.unwrap_or_else(|| merged.inferred_layer()));
        merged
    }
}

/// An operation that was actually applied, with normalized payloads and stable ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AppliedOp {
    AddNode { node: Node },
    UpdateNode { id: NodeId, patch: NodePatch },
    RemoveNode { id: NodeId },
    AddEdge { edge: Edge },
    RemoveEdge { id: EdgeId },
}

impl From<&AppliedOp> for PatchOp {
    fn from(op: &AppliedOp) -> Self {
        match op {
            AppliedOp::AddNode { node } => Self::AddNode {
                node: RawNode::from(node),
            },
            AppliedOp::UpdateNode { id, patch } => Self::UpdateNode {
                id: id.to_string(),
                patch: RawNode::from(patch),
            },
            AppliedOp::RemoveNode { id } => Self::RemoveNode { id: id.to_string() },
            AppliedOp::AddEdge { edge } => Self::AddEdge {
                edge: RawEdge::from(edge),
            },
            AppliedOp::RemoveEdge { id } => Self::RemoveEdge { id: id.to_string() },
        }
    }
}

/// The subset of a patch that was applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedPatch {
    pub ops: Vec<AppliedOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl AppliedPatch {
    /// Number of applied ops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing was applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl From<&AppliedPatch> for GraphPatch {
    fn from(applied: &AppliedPatch) -> Self {
        Self {
            ops: applied.ops.iter().map(PatchOp::from).collect(),
            notes: applied.notes.clone(),
        }
    }
}
