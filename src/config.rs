//! Engine configuration.
//!
//! There is no ambient/global state: every entry point receives an
//! [`EngineConfig`] value. The only behavioural toggle the consistency engine
//! recognises is [`EngineConfig::allow_delete`]; the remaining fields tune the
//! cleanup and motif passes.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Tuning for the motif lifecycle passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotifConfig {
    /// Motifs at or above this confidence start out `active`, below it `uncertain`.
    pub active_threshold: f64,
    /// Maximum number of active, non-resolved motifs per anchor concept.
    pub max_active_per_anchor: usize,
    /// Maximum number of history entries kept per motif.
    pub history_cap: usize,
    /// Maximum confidence gap for a triad to subsume one of its pairs.
    pub subsumption_margin: f64,
}

impl Default for MotifConfig {
    fn default() -> Self {
        Self {
            active_threshold: 0.7,
            max_active_per_anchor: 4,
            history_cap: 20,
            subsumption_margin: 0.08,
        }
    }
}

/// Configuration threaded into every engine entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether `remove_node` / `remove_edge` ops are permitted at all.
    pub allow_delete: bool,
    /// Id prefixes marking temporary ids that are rewritten before application.
    pub temp_id_prefixes: Vec<String>,
    /// Edges incident to the root goal above which the rebalancer re-routes details.
    pub max_root_fanout: usize,
    /// Maximum number of concepts produced by derivation.
    pub concept_limit: usize,
    /// Motif lifecycle tuning.
    pub motif: MotifConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allow_delete: false,
            temp_id_prefixes: vec!["t_".to_string(), "tmp_".to_string()],
            max_root_fanout: 6,
            concept_limit: 180,
            motif: MotifConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Returns a copy with destructive ops enabled or disabled.
    #[must_use]
    pub fn with_allow_delete(mut self, allow_delete: bool) -> Self {
        self.allow_delete = allow_delete;
        self
    }

    /// Returns true if `id` carries one of the temporary-id prefixes.
    #[must_use]
    pub fn is_temp_id(&self, id: &str) -> bool {
        self.temp_id_prefixes
            .iter()
            .any(|p| !p.is_empty() && id.starts_with(p.as_str()) && id.len() > p.len())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.temp_id_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(ValidationError::InvalidField {
                field: "temp_id_prefixes".to_string(),
                reason: "prefixes must be non-empty".to_string(),
            });
        }
        if self.max_root_fanout == 0 {
            return Err(ValidationError::InvalidField {
                field: "max_root_fanout".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.concept_limit == 0 {
            return Err(ValidationError::InvalidField {
                field: "concept_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let m = &self.motif;
        for (field, value) in [
            ("motif.active_threshold", m.active_threshold),
            ("motif.subsumption_margin", m.subsumption_margin),
        ] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ValidationError::OutOfRange {
                    field: field.to_string(),
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        if m.max_active_per_anchor == 0 || m.history_cap == 0 {
            return Err(ValidationError::InvalidField {
                field: "motif".to_string(),
                reason: "max_active_per_anchor and history_cap must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert!(!cfg.allow_delete);
        assert_eq!(cfg.motif.max_active_per_anchor, 4);
        assert_eq!(cfg.motif.history_cap, 20);
        assert_eq!(cfg.concept_limit, 180);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_temp_id_detection() {
        let cfg = EngineConfig::default();
        assert!(cfg.is_temp_id("t_1"));
        assert!(cfg.is_temp_id("tmp_goal"));
        assert!(!cfg.is_temp_id("t_"));
        assert!(!cfg.is_temp_id("trip"));
        assert!(!cfg.is_temp_id("n_4f2a"));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut cfg = EngineConfig::default();
        cfg.motif.active_threshold = 1.2;
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"allow_delete": true}"#).unwrap();
        assert!(cfg.allow_delete);
        assert_eq!(cfg.max_root_fanout, 6);
        assert_eq!(cfg.temp_id_prefixes, vec!["t_", "tmp_"]);
    }
}
