//! Semantic slots: classification interface, default rules and place validity.

mod classifier;
mod rules;
mod validity;

pub use classifier::{
    normalize_text, slot_key, slot_of, tokenize, SemanticSlot, SlotClassifier, SlotFamily, SlotValue,
};
pub use rules::{parse_count, RuleClassifier};
pub use validity::{is_valid_place, normalize_place, MAX_PLACE_CHARS};
