//! Canonical concepts derived from the consistent intent graph.

mod derive;
mod reconcile;
mod similarity;
mod types;

pub use derive::{concept_kind, derive_concepts, node_score, sort_concepts, MAX_EVIDENCE_TERMS};
pub use reconcile::reconcile_concepts;
pub use similarity::{bigram_jaccard, is_near_duplicate, token_jaccard};
pub use types::{Concept, ConceptId, ConceptKind};
