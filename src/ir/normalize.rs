//! Node/edge normalization.
//!
//! Normalization is total: malformed payloads yield `None` and the caller drops
//! the op. Numeric fields accept numbers or numeric strings and are clamped
//! into `[0, 1]`; absent or non-finite values fall back to the type default.

use serde_json::Value;

use crate::graph::{
    Edge, EdgeId, EdgeType, Node, NodeId, NodeLayer, NodeStatus, NodeType, Severity, Strength,
    DEFAULT_EDGE_CONFIDENCE,
};

use super::operations::{NodePatch, RawEdge, RawNode};

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses whitespace and returns `None` if nothing is left.
#[must_use]
pub fn non_empty(s: Option<&str>) -> Option<String> {
    let collapsed = collapse_whitespace(s?);
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Reads a number or numeric string, clamped into `[0, 1]`. Non-finite values are absent.
#[must_use]
pub fn unit_interval(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then(|| n.clamp(0.0, 1.0))
}

fn clean_list(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = collapse_whitespace(item);
        if !item.is_empty() && !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

fn normalize_key(key: Option<&str>) -> Option<String> {
    non_empty(key).map(|k| k.to_lowercase())
}

/// Normalizes a full node payload.
#[must_use]
pub fn normalize_node(raw: &RawNode) -> Option<Node> {
    let id = non_empty(raw.id.as_deref())?;
    let node_type = NodeType::parse(raw.node_type.as_deref()?)?;
    let statement = non_empty(raw.statement.as_deref())?;

    let mut node = Node {
        id: NodeId::new(id),
        node_type,
        layer: None,
        statement,
        status: raw
            .status
            .as_deref()
            .and_then(NodeStatus::parse)
            .unwrap_or_default(),
        confidence: unit_interval(raw.confidence.as_ref())
            .unwrap_or_else(|| node_type.default_confidence()),
        strength: if node_type == NodeType::Constraint {
            raw.strength.as_deref().and_then(Strength::parse)
        } else {
            None
        },
        severity: raw.severity.as_deref().and_then(Severity::parse),
        importance: unit_interval(raw.importance.as_ref()),
        tags: raw.tags.as_deref().map(clean_list).unwrap_or_default(),
        locked: raw.locked.unwrap_or(false),
        key: normalize_key(raw.key.as_deref()),
        evidence_ids: raw.evidence_ids.as_deref().map(clean_list).unwrap_or_default(),
        source_msg_ids: raw
            .source_msg_ids
            .as_deref()
            .map(clean_list)
            .unwrap_or_default(),
    };
    node.layer = Some(
        raw.layer
            .as_deref()
            .and_then(NodeLayer::parse)
            .unwrap_or_else(|| node.inferred_layer()),
    );
    Some(node)
}

/// Normalizes a partial node payload. Returns `None` when no recognized field survives.
#[must_use]
pub fn normalize_node_patch(raw: &RawNode) -> Option<NodePatch> {
    let patch = NodePatch {
        node_type: raw.node_type.as_deref().and_then(NodeType::parse),
        layer: raw.layer.as_deref().and_then(NodeLayer::parse),
        statement: non_empty(raw.statement.as_deref()),
        status: raw.status.as_deref().and_then(NodeStatus::parse),
        confidence: unit_interval(raw.confidence.as_ref()),
        strength: raw.strength.as_deref().and_then(Strength::parse),
        severity: raw.severity.as_deref().and_then(Severity::parse),
        importance: unit_interval(raw.importance.as_ref()),
        tags: raw.tags.as_deref().map(clean_list),
        locked: raw.locked,
        key: normalize_key(raw.key.as_deref()),
        evidence_ids: raw.evidence_ids.as_deref().map(clean_list),
        source_msg_ids: raw.source_msg_ids.as_deref().map(clean_list),
    };
    (!patch.is_empty()).then_some(patch)
}

/// Normalizes an edge payload.
#[must_use]
pub fn normalize_edge(raw: &RawEdge) -> Option<Edge> {
    let id = non_empty(raw.id.as_deref())?;
    let from = non_empty(raw.from.as_deref())?;
    let to = non_empty(raw.to.as_deref())?;
    let edge_type = EdgeType::parse(raw.edge_type.as_deref()?)?;
    Some(Edge {
        id: EdgeId::new(id),
        from: NodeId::new(from),
        to: NodeId::new(to),
        edge_type,
        confidence: unit_interval(raw.confidence.as_ref()).unwrap_or(DEFAULT_EDGE_CONFIDENCE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_node(value: serde_json::Value) -> RawNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(non_empty(Some("   ")), None);
    }

    #[test]
    fn test_unit_interval_accepts_strings_and_clamps() {
        assert_eq!(unit_interval(Some(&json!("0.4"))), Some(0.4));
        assert_eq!(unit_interval(Some(&json!(3))), Some(1.0));
        assert_eq!(unit_interval(Some(&json!(-1.5))), Some(0.0));
        assert_eq!(unit_interval(Some(&json!("NaN"))), None);
        assert_eq!(unit_interval(Some(&json!(true))), None);
        assert_eq!(unit_interval(None), None);
    }

    #[test]
    fn test_node_requires_id_type_statement() {
        assert!(normalize_node(&raw_node(json!({"type": "goal", "statement": "x"}))).is_none());
        assert!(normalize_node(&raw_node(json!({"id": "n", "type": "wish", "statement": "x"}))).is_none());
        assert!(normalize_node(&raw_node(json!({"id": "n", "type": "goal", "statement": "  "}))).is_none());
    }

    #[test]
    fn test_node_defaults() {
        let node = normalize_node(&raw_node(json!({
            "id": "  n1 ",
            "type": "Constraint",
            "statement": "Budget   under 10000",
            "status": "bogus",
            "confidence": "inf",
            "strength": "hard",
            "tags": ["a", " a ", "", "b"]
        })))
        .unwrap();

        assert_eq!(node.id.as_str(), "n1");
        assert_eq!(node.statement, "Budget under 10000");
        assert_eq!(node.status, NodeStatus::Proposed);
        assert!((node.confidence - 0.75).abs() < f64::EPSILON);
        assert_eq!(node.strength, Some(Strength::Hard));
        assert_eq!(node.tags, vec!["a", "b"]);
        assert_eq!(node.layer, Some(NodeLayer::Requirement));
    }

    #[test]
    fn test_strength_dropped_for_non_constraints() {
        let node = normalize_node(&raw_node(json!({
            "id": "n1", "type": "fact", "statement": "x", "strength": "hard"
        })))
        .unwrap();
        assert_eq!(node.strength, None);
    }

    #[test]
    fn test_explicit_layer_wins() {
        let node = normalize_node(&raw_node(json!({
            "id": "n1", "type": "fact", "statement": "x", "layer": "risk"
        })))
        .unwrap();
        assert_eq!(node.layer, Some(NodeLayer::Risk));
    }

    #[test]
    fn test_empty_patch_is_none() {
        assert!(normalize_node_patch(&raw_node(json!({"status": "nope", "statement": " "}))).is_none());
        let patch = normalize_node_patch(&raw_node(json!({"confidence": "0.9"}))).unwrap();
        assert_eq!(patch.confidence, Some(0.9));
    }

    #[test]
    fn test_edge_normalization() {
        let edge: RawEdge = serde_json::from_value(json!({
            "id": "e1", "from": "a", "to": "b", "type": "determine"
        }))
        .unwrap();
        let edge = normalize_edge(&edge).unwrap();
        assert_eq!(edge.edge_type, EdgeType::Determine);
        assert!((edge.confidence - DEFAULT_EDGE_CONFIDENCE).abs() < f64::EPSILON);

        let bad: RawEdge = serde_json::from_value(json!({
            "id": "e1", "from": "a", "to": "b", "type": "causes"
        }))
        .unwrap();
        assert!(normalize_edge(&bad).is_none());
    }
}
