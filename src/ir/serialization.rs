//! JSON helpers for the wire formats.
//!
//! Serde does the work; this module gives callers one place for decode/encode
//! errors and keeps pretty formatting stable.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Deserializes any wire type from JSON text.
pub fn from_json<T: DeserializeOwned>(s: &str) -> Result<T, CodecError> {
    serde_json::from_str::<T>(s).map_err(|e| CodecError::Decode {
        what: std::any::type_name::<T>(),
        message: e.to_string(),
    })
}

/// Serializes any wire type to pretty JSON.
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string_pretty(value).map_err(|e| CodecError::Encode {
        what: std::any::type_name::<T>(),
        message: e.to_string(),
    })
}

/// Reads and decodes a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CodecError> {
    let text = fs::read_to_string(path).map_err(|e| CodecError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    from_json(&text)
}

/// Encodes a value and writes it to a file, with a trailing newline.
pub fn save_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), CodecError> {
    let mut text = to_json_pretty(value)?;
    text.push('\n');
    fs::write(path, text).map_err(|e| CodecError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{IntentGraph, Node, NodeType};
    use crate::ir::GraphPatch;

    #[test]
    fn test_patch_from_json() {
        let patch: GraphPatch = from_json(
            r#"{"ops":[{"op":"add_node","node":{"id":"t_1","type":"goal","statement":"Plan a trip"}}]}"#,
        )
        .unwrap();
        assert_eq!(patch.ops.len(), 1);
    }

    #[test]
    fn test_decode_error_names_type() {
        let err = from_json::<IntentGraph>("{not json").unwrap_err();
        let CodecError::Decode { what, .. } = err else {
            panic!("expected decode error");
        };
        assert!(what.contains("IntentGraph"));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let graph = IntentGraph::from_parts("g", 2, vec![Node::new("a", NodeType::Goal, "Plan")], vec![]);

        save_json_pretty(&path, &graph).unwrap();
        let loaded: IntentGraph = load_json(&path).unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_json::<IntentGraph>(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CodecError::Io { .. }));
    }
}
