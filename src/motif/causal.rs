//! Causal reading of motifs.

use crate::graph::EdgeType;

use super::types::{CausalOperator, MotifType};

/// Maximum characters of a concept title inside a formula.
pub const FORMULA_TITLE_CHARS: usize = 24;

/// Maps a dependency class and motif shape to its causal operator.
#[must_use]
pub const fn causal_operator(class: EdgeType, motif_type: MotifType) -> CausalOperator {
    match (class, motif_type) {
        (EdgeType::Enable, MotifType::Pair) => CausalOperator::DirectCausation,
        (EdgeType::Enable, MotifType::Triad) => CausalOperator::MediatedCausation,
        (EdgeType::Constraint, _) => CausalOperator::Confounding,
        (EdgeType::Determine, _) => CausalOperator::Intervention,
        (EdgeType::ConflictsWith, _) => CausalOperator::Contradiction,
    }
}

/// Shortens a title to [`FORMULA_TITLE_CHARS`] characters.
#[must_use]
pub fn short_title(title: &str) -> String {
    let title = title.trim();
    if title.chars().count() <= FORMULA_TITLE_CHARS {
        return title.to_string();
    }
    let mut short: String = title.chars().take(FORMULA_TITLE_CHARS - 1).collect();
    short.push('…');
    short
}

/// Renders the formula of a motif whose sources are `sources` and anchor `anchor`.
///
/// Pairs use the first source only; triads the first two.
#[must_use]
pub fn causal_formula(operator: CausalOperator, sources: &[&str], anchor: &str) -> String {
    let t = short_title(anchor);
    let a = sources.first().map(|s| short_title(s)).unwrap_or_default();
    let b = sources.get(1).map(|s| short_title(s));

    match (operator, b) {
        (CausalOperator::DirectCausation, _) | (CausalOperator::MediatedCausation, None) => {
            format!("{a} -> {t}")
        }
        (CausalOperator::MediatedCausation, Some(b)) => format!("{a} -> {b} -> {t}"),
        (CausalOperator::Confounding, None) => format!("{t} <- {a} -> plan"),
        (CausalOperator::Confounding, Some(b)) => format!("{a} <- {b} -> {t}"),
        (CausalOperator::Intervention, None) => format!("do({a}) -> {t}"),
        (CausalOperator::Intervention, Some(b)) => format!("do({a}, {b}) -> {t}"),
        (CausalOperator::Contradiction, None) => format!("{a} ⊥ {t}"),
        (CausalOperator::Contradiction, Some(b)) => format!("({a}, {b}) ⊥ {t}"),
    }
}
