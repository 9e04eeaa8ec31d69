//! Motif mining, causal annotation and lifecycle management.

mod causal;
mod lifecycle;
mod miner;
mod types;

pub use causal::{causal_formula, causal_operator, short_title, FORMULA_TITLE_CHARS};
pub use lifecycle::{
    reconcile_motifs, resolve_motif, sort_motifs, REASON_ALL_PAUSED, REASON_LOW_CONFIDENCE,
    REASON_NOT_SUPPORTED, REASON_RELATION_CONFLICTS,
};
pub use miner::{is_negated, mine_motifs};
pub use types::{
    CausalOperator, HistoryEntry, Motif, MotifId, MotifStatus, MotifType, Novelty, SYSTEM_ACTOR,
};
