//! Text similarity used to merge near-duplicate concepts.

use std::collections::BTreeSet;

use crate::slot::{normalize_text, tokenize, SlotFamily};

/// Token Jaccard threshold.
pub const TOKEN_THRESHOLD: f64 = 0.72;
/// Character-bigram Jaccard threshold.
pub const BIGRAM_THRESHOLD: f64 = 0.80;
/// Token Jaccard threshold within limiting factors.
pub const LIMITING_TOKEN_THRESHOLD: f64 = 0.5;
/// Character-bigram Jaccard threshold within limiting factors.
pub const LIMITING_BIGRAM_THRESHOLD: f64 = 0.62;

fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let inter = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    inter as f64 / union as f64
}

/// Jaccard similarity of word tokens (CJK split per character).
#[must_use]
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    jaccard(&tokenize(a), &tokenize(b))
}

fn bigrams(s: &str) -> BTreeSet<(char, char)> {
    let chars: Vec<char> = normalize_text(s).chars().filter(|c| !c.is_whitespace()).collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Jaccard similarity of character bigrams, ignoring whitespace and punctuation.
#[must_use]
pub fn bigram_jaccard(a: &str, b: &str) -> f64 {
    jaccard(&bigrams(a), &bigrams(b))
}

/// Returns true if two concept texts of `family` are near duplicates.
#[must_use]
pub fn is_near_duplicate(a: &str, b: &str, family: SlotFamily) -> bool {
    let (token_min, bigram_min) = if family == SlotFamily::LimitingFactor {
        (LIMITING_TOKEN_THRESHOLD, LIMITING_BIGRAM_THRESHOLD)
    } else {
        (TOKEN_THRESHOLD, BIGRAM_THRESHOLD)
    };
    token_jaccard(a, b) >= token_min || bigram_jaccard(a, b) >= bigram_min
}
