//! Error types for intentgraph.
//!
//! The consistency and mining engines are fail-soft: malformed ops, nodes and
//! edges are dropped rather than reported. Errors only surface at the outer
//! edges of the crate (decoding snapshots, validating configuration, recording
//! user resolutions), and all of them are strongly typed using thiserror.

use thiserror::Error;

/// Validation errors raised by configuration and explicit user requests.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Value {value} for '{field}' is out of range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        field: String,
        reason: String,
    },

    #[error("Unknown {vocabulary} '{value}'")]
    UnknownVariant {
        vocabulary: &'static str,
        value: String,
    },

    #[error("Motif status '{status}' cannot be set by a user resolution")]
    InvalidResolution {
        status: String,
    },
}

/// Errors reading or writing JSON snapshots.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to decode {what}: {message}")]
    Decode {
        what: &'static str,
        message: String,
    },

    #[error("Failed to encode {what}: {message}")]
    Encode {
        what: &'static str,
        message: String,
    },

    #[error("I/O error on '{path}': {message}")]
    Io {
        path: String,
        message: String,
    },
}

/// Top-level error type for intentgraph.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl IntentError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a codec error.
    #[must_use]
    pub const fn is_codec(&self) -> bool {
        matches!(self, Self::Codec(_))
    }
}

/// Result type alias for intentgraph operations.
pub type IntentResult<T> = Result<T, IntentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = ValidationError::OutOfRange {
            field: "active_threshold".to_string(),
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("active_threshold"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = ValidationError::UnknownVariant {
            vocabulary: "motif status",
            value: "paused".to_string(),
        };
        assert_eq!(format!("{err}"), "Unknown motif status 'paused'");
    }

    #[test]
    fn test_codec_error_io() {
        let err = CodecError::Io {
            path: "graph.json".to_string(),
            message: "not found".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("graph.json"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_intent_error_from_validation() {
        let err: IntentError = ValidationError::MissingField {
            field: "id".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_codec());
    }

    #[test]
    fn test_intent_error_from_codec() {
        let err: IntentError = CodecError::Decode {
            what: "patch",
            message: "eof".to_string(),
        }
        .into();
        assert!(err.is_codec());
        assert!(format!("{err}").contains("patch"));
    }
}
