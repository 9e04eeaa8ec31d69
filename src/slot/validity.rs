//! Place-name validity predicate used by structured slots.

/// Tokens that are placeholders rather than places.
const NON_PLACE_TOKENS: &[&str] = &[
    "unknown", "tbd", "tba", "n/a", "na", "none", "null", "undefined", "somewhere", "anywhere",
    "everywhere", "elsewhere", "待定", "未知", "不确定", "不知道", "随便", "都行", "任意", "某地",
    "其他", "目的地", "城市", "地方", "哪里", "行程", "旅行", "旅游",
];

/// Separators that join several places into one value.
const CONJUNCTION_MARKERS: &[&str] = &[
    "和", "与", "及", "跟", "、", "，", ",", "/", "&", "+", "或", "还有", "以及", " and ", " or ",
];

/// First-person or sentence material that does not belong in a place name.
const NARRATIVE_MARKERS: &[&str] = &[
    "我", "想", "打算", "计划", "希望", "需要", "可能", "应该", "。", "！", "？", "!", "?", ";",
    "；", " i ", " we ", " want ", " plan ", " maybe ", " would ",
];

/// Routing words that turn a place into a journey.
const DIRECTION_MARKERS: &[&str] = &[
    "从", "到", "去", "出发", "前往", "经过", "途经", " from ", " to ", " via ", " through ",
];

/// Longest accepted place value, in characters.
pub const MAX_PLACE_CHARS: usize = 24;

/// Returns true if `raw` plausibly names exactly one place.
#[must_use]
pub fn is_valid_place(raw: &str) -> bool {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();
    if chars == 0 || chars > MAX_PLACE_CHARS {
        return false;
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if NON_PLACE_TOKENS.contains(&lower.as_str()) {
        return false;
    }

    // Pad so English markers only match whole words.
    let padded = format!(" {lower} ");
    let hit = |markers: &[&str]| markers.iter().any(|m| padded.contains(m));
    !(hit(CONJUNCTION_MARKERS) || hit(NARRATIVE_MARKERS) || hit(DIRECTION_MARKERS))
}

/// Canonical form of a place for slot keys.
#[must_use]
pub fn normalize_place(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || "：。，、！？".contains(c));
    trimmed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_places_are_valid() {
        for place in ["米兰", "Milan", "New York", "St. Moritz", "Reggio Emilia"] {
            assert!(is_valid_place(place), "{place}");
        }
    }

    #[test]
    fn test_placeholders_rejected() {
        for place in ["待定", "TBD", "unknown", "", "   "] {
            assert!(!is_valid_place(place), "{place}");
        }
    }

    #[test]
    fn test_multiple_places_rejected() {
        for place in ["米兰和罗马", "米兰、罗马", "Milan and Rome", "Milan/Rome", "Milan & Rome"] {
            assert!(!is_valid_place(place), "{place}");
        }
    }

    #[test]
    fn test_narrative_and_direction_rejected() {
        for place in ["我想去米兰", "从北京到米兰", "from Beijing to Milan", "米兰。", "Milan via Zurich"] {
            assert!(!is_valid_place(place), "{place}");
        }
    }

    #[test]
    fn test_whole_word_english_markers() {
        // "to" inside a name is not a direction marker.
        assert!(is_valid_place("Toronto"));
        assert!(is_valid_place("Andorra"));
    }

    #[test]
    fn test_overlong_rejected() {
        assert!(!is_valid_place(&"a".repeat(MAX_PLACE_CHARS + 1)));
    }

    #[test]
    fn test_normalize_place() {
        assert_eq!(normalize_place("  Milan. "), "milan");
        assert_eq!(normalize_place("米兰："), "米兰");
    }
}
