//! Semantic slot classification interface.
//!
//! A slot is the normalized category a node speaks about (`destination:milan`,
//! `duration_total`, `budget`, ...). The mapping from slot family to concept
//! kind and the cardinality rules live in this crate; turning statement text
//! into a slot is delegated to a [`SlotClassifier`], so alternate extraction
//! engines can be swapped without touching consistency or motif logic.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::Node;

/// Family of a semantic slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotFamily {
    Goal,
    Destination,
    DurationTotal,
    DurationCity,
    Budget,
    /// Derived bookkeeping (what is left of a budget). Never a motif endpoint.
    BudgetRemaining,
    People,
    Date,
    Lodging,
    Transport,
    Activity,
    /// Health, legal, safety, visa, diet or language limitations.
    LimitingFactor,
    Preference,
    Generic,
}

impl SlotFamily {
    /// Stable snake_case name, also used as the key prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Destination => "destination",
            Self::DurationTotal => "duration_total",
            Self::DurationCity => "duration_city",
            Self::Budget => "budget",
            Self::BudgetRemaining => "budget_remaining",
            Self::People => "people",
            Self::Date => "date",
            Self::Lodging => "lodging",
            Self::Transport => "transport",
            Self::Activity => "activity",
            Self::LimitingFactor => "limiting_factor",
            Self::Preference => "preference",
            Self::Generic => "generic",
        }
    }

    /// Parses the family from a slot key such as `destination:milan`.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        let prefix = key.split(':').next().unwrap_or_default().trim();
        match prefix {
            "goal" => Self::Goal,
            "destination" => Self::Destination,
            "duration_total" => Self::DurationTotal,
            "duration_city" => Self::DurationCity,
            "budget" => Self::Budget,
            "budget_remaining" => Self::BudgetRemaining,
            "people" => Self::People,
            "date" => Self::Date,
            "lodging" => Self::Lodging,
            "transport" => Self::Transport,
            "activity" => Self::Activity,
            "limiting_factor" => Self::LimitingFactor,
            "preference" => Self::Preference,
            _ => Self::Generic,
        }
    }

    /// Families whose value embeds a place name that must pass the validity predicate.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Destination | Self::DurationCity)
    }

    /// Families excluded from motif mining.
    #[must_use]
    pub const fn is_bookkeeping(self) -> bool {
        matches!(self, Self::BudgetRemaining)
    }

    /// Families whose concepts never merge by text similarity.
    #[must_use]
    pub const fn never_merges(self) -> bool {
        matches!(self, Self::Destination | Self::DurationCity | Self::Goal)
    }
}

impl fmt::Display for SlotFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured value carried by a slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotValue {
    #[default]
    None,
    /// A single place name, as written.
    Place { place: String },
    /// Total trip length. `explicit` is true when phrased as a total.
    TotalDays { days: u32, explicit: bool },
    /// Days spent in one place.
    PlaceDays { place: String, days: u32 },
    /// A money amount.
    Amount { amount: f64 },
    /// A free-text qualifier (e.g. the kind of limiting factor).
    Label { label: String },
}

impl SlotValue {
    /// The embedded place name, if any.
    #[must_use]
    pub fn place(&self) -> Option<&str> {
        match self {
            Self::Place { place } | Self::PlaceDays { place, .. } => Some(place),
            _ => None,
        }
    }

    /// The embedded day count, if any.
    #[must_use]
    pub fn days(&self) -> Option<u32> {
        match self {
            Self::TotalDays { days, .. } | Self::PlaceDays { days, .. } => Some(*days),
            _ => None,
        }
    }
}

/// The classified slot of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticSlot {
    pub key: String,
    pub family: SlotFamily,
    #[serde(default)]
    pub value: SlotValue,
}

impl SemanticSlot {
    /// Creates a slot.
    #[must_use]
    pub fn new(key: impl Into<String>, family: SlotFamily, value: SlotValue) -> Self {
        Self {
            key: key.into(),
            family,
            value,
        }
    }
}

/// Text-to-slot classification.
pub trait SlotClassifier: Send + Sync {
    /// Classifies a node from its type, layer and statement. `None` means no slot.
    fn classify(&self, node: &Node) -> Option<SemanticSlot>;
}

/// Resolves the slot of a node, letting an explicit `key` override classification.
///
/// The family of an explicit key comes from its prefix; the structured value is
/// kept from classification when the families agree.
#[must_use]
pub fn slot_of(node: &Node, classifier: &dyn SlotClassifier) -> Option<SemanticSlot> {
    let classified = classifier.classify(node);
    let Some(key) = node.key.as_deref().filter(|k| !k.trim().is_empty()) else {
        return classified;
    };

    let family = SlotFamily::from_key(key);
    let value = match classified {
        Some(slot) if slot.family == family => slot.value,
        _ => match (family, key.split_once(':')) {
            (SlotFamily::Destination, Some((_, place))) => SlotValue::Place {
                place: place.trim().to_string(),
            },
            _ => SlotValue::None,
        },
    };
    Some(SemanticSlot::new(key.trim(), family, value))
}

/// Builds a `<family>:<normalized text>` key.
#[must_use]
pub fn slot_key(family: SlotFamily, text: &str) -> String {
    format!("{}:{}", family.as_str(), normalize_text(text))
}

/// Lowercases, replaces punctuation with spaces and collapses whitespace.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32, 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF)
}

/// Word tokens of `s`. CJK runs are split into single characters.
#[must_use]
pub fn tokenize(s: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for word in normalize_text(s).split(' ').filter(|w| !w.is_empty()) {
        if word.chars().any(is_cjk) {
            let mut latin = String::new();
            for c in word.chars() {
                if is_cjk(c) {
                    if !latin.is_empty() {
                        tokens.insert(std::mem::take(&mut latin));
                    }
                    tokens.insert(c.to_string());
                } else {
                    latin.push(c);
                }
            }
            if !latin.is_empty() {
                tokens.insert(latin);
            }
        } else {
            tokens.insert(word.to_string());
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeType;

    struct Fixed(Option<SemanticSlot>);

    impl SlotClassifier for Fixed {
        fn classify(&self, _node: &Node) -> Option<SemanticSlot> {
            self.0.clone()
        }
    }

    #[test]
    fn test_family_from_key() {
        assert_eq!(SlotFamily::from_key("destination:milan"), SlotFamily::Destination);
        assert_eq!(SlotFamily::from_key("budget"), SlotFamily::Budget);
        assert_eq!(SlotFamily::from_key("weird:thing"), SlotFamily::Generic);
    }

    #[test]
    fn test_explicit_key_overrides() {
        let node = Node::new("n1", NodeType::Fact, "whatever").with_key("destination:rome");
        let slot = slot_of(&node, &Fixed(None)).unwrap();
        assert_eq!(slot.key, "destination:rome");
        assert_eq!(slot.family, SlotFamily::Destination);
        assert_eq!(slot.value.place(), Some("rome"));
    }

    #[test]
    fn test_explicit_key_keeps_matching_value() {
        let classified = SemanticSlot::new(
            "duration_total",
            SlotFamily::DurationTotal,
            SlotValue::TotalDays {
                days: 5,
                explicit: true,
            },
        );
        let node = Node::new("n1", NodeType::Fact, "5 days").with_key("duration_total");
        let slot = slot_of(&node, &Fixed(Some(classified))).unwrap();
        assert_eq!(slot.value.days(), Some(5));
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("Budget: ≤ 10,000!"), "budget 10 000");
        assert_eq!(normalize_text("目的地：米兰"), "目的地 米兰");
    }

    #[test]
    fn test_tokenize_splits_cjk() {
        let tokens = tokenize("米兰 hotel5星");
        let expected: BTreeSet<String> = ["米", "兰", "hotel5", "星"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens, expected);
    }
}
