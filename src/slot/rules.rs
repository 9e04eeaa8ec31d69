//! Default rule-based slot classifier for Chinese and English travel intents.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::graph::{Node, NodeLayer, NodeType};

use super::classifier::{normalize_text, slot_key, SemanticSlot, SlotClassifier, SlotFamily, SlotValue};
use super::validity::normalize_place;

static PATTERNS: OnceLock<Result<SlotPatterns, regex::Error>> = OnceLock::new();

/// Pre-compiled patterns, built once.
#[derive(Debug)]
struct SlotPatterns {
    destination: Regex,
    date: Regex,
    total_marker: Regex,
    place_days_cjk: Regex,
    place_days_en_trailing: Regex,
    place_days_en_leading: Regex,
    bare_days: Regex,
    budget_marker: Regex,
    amount: Regex,
    people_count: Regex,
}

impl SlotPatterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            destination: Regex::new(r"^(?:目的地|destination)\s*(?:是|is|[：:=])\s*(?P<place>.+)$")?,
            date: Regex::new(
                r"\d{1,2}\s*月\s*\d{1,2}\s*[日号]|\d{4}-\d{1,2}-\d{1,2}|出发日期|出发时间|日期|\bdate\b|\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?\b",
            )?,
            total_marker: Regex::new(r"总共|一共|总计|全程|合计|\btotal\b|\boverall\b|\bwhole trip\b|\bentire trip\b")?,
            place_days_cjk: Regex::new(
                r"(?P<place>[\p{Han}A-Za-z·]{1,12}?)\s*[：:]?\s*(?:待|玩|停留|逗留|住)?\s*(?P<days>\d+|[一二两三四五六七八九十]{1,3})\s*(?:天|日|晚)",
            )?,
            place_days_en_trailing: Regex::new(
                r"(?P<days>\d+)\s*(?:days?|nights?)\s+(?:in|at)\s+(?P<place>[a-z][a-z .'&,/+-]*)",
            )?,
            place_days_en_leading: Regex::new(
                r"^(?:stay\s+in\s+)?(?P<place>[a-z][a-z .'&,/+-]*?)\s*(?::|-|\bfor\b)\s*(?P<days>\d+)\s*(?:days?|nights?)",
            )?,
            bare_days: Regex::new(
                r"(?P<days>\d+|[一二两三四五六七八九十]{1,3})\s*(?:天|日|days?|nights?)",
            )?,
            budget_marker: Regex::new(r"预算|花费|费用|\b(?:budget|costs?|spend(?:s|ing)?)\b")?,
            amount: Regex::new(
                r"(?P<symbol>[¥$€£])?\s*(?P<num>\d+(?:\.\d+)?)\s*(?P<unit>万|千|k\b|w\b)?\s*(?:(?P<currency>元|块|rmb\b|yuan\b|usd\b|eur\b|euros?\b|dollars?\b)|(?P<span>天|日|晚|个月|月|周|人|位|days?\b|nights?\b|weeks?\b|months?\b|people\b))?",
            )?,
            people_count: Regex::new(
                r"(?P<n>\d+|[一二两三四五六七八九十]{1,2})\s*(?:个人|口人|人|位)|\d+\s*(?:people|persons|adults|travell?ers|pax)\b",
            )?,
        })
    }
}

fn patterns() -> Option<&'static SlotPatterns> {
    match PATTERNS.get_or_init(SlotPatterns::compile) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(error = %e, "slot patterns failed to compile; classification disabled");
            None
        }
    }
}

const REMAINING_BUDGET_MARKERS: &[&str] = &[
    "剩余预算", "预算剩余", "剩下", "还剩", "remaining budget", "budget left", "budget remaining",
    "left over",
];
/// Largest gap in bytes between a budget marker and an untagged number that still belongs to it.
const MARKER_GAP: usize = 12;
const PEOPLE_MARKERS: &[&str] = &[
    "同行", "家人", "父母", "孩子", "带着", "travel with", "travelling with", "traveling with",
    "party of",
];
/// Words that look like a place in front of a day count but describe the whole trip.
const TRIP_WORDS: &[&str] = &[
    "行程", "旅行", "旅游", "整个", "这次", "计划", "大概", "预计", "trip", "journey", "vacation",
    "holiday",
];
const LIMITING_FACTORS: &[(&str, &[&str])] = &[
    (
        "health",
        &[
            "健康", "心脏", "病", "医疗", "过敏", "药", "轮椅", "行动不便", "health", "medical",
            "allergy", "allergic", "wheelchair", "mobility", "medication",
        ],
    ),
    ("legal", &["法律", "违法", "legal", "law", "permit"]),
    ("safety", &["安全", "治安", "危险", "safety", "safe", "danger"]),
    ("visa", &["签证", "护照", "visa", "passport"]),
    (
        "diet",
        &["饮食", "素食", "清真", "忌口", "vegetarian", "vegan", "halal", "gluten", "diet"],
    ),
    ("language", &["语言", "翻译", "language", "translator", "interpreter"]),
];
const LODGING_MARKERS: &[&str] = &[
    "酒店", "住宿", "民宿", "宾馆", "hotel", "hostel", "airbnb", "lodging", "accommodation",
];
const TRANSPORT_MARKERS: &[&str] = &[
    "高铁", "火车", "飞机", "航班", "自驾", "租车", "地铁", "交通", "train", "flight", "rental car",
    "drive", "bus", "transport",
];
const ACTIVITY_MARKERS: &[&str] = &[
    "博物馆", "美术馆", "徒步", "购物", "看球", "参观", "游览", "演唱会", "museum", "gallery",
    "hike", "hiking", "shopping", "tour", "concert", "match",
];

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// Byte span of the earliest marker found in `text`.
fn marker_span(text: &str, markers: &[&str]) -> Option<(usize, usize)> {
    markers
        .iter()
        .filter_map(|m| text.find(m).map(|start| (start, start + m.len())))
        .min()
}

/// Longest stay a single statement may name.
pub const MAX_TRIP_DAYS: u32 = 365;

/// Parses an Arabic or small Chinese numeral (up to 99).
#[must_use]
pub fn parse_count(s: &str) -> Option<u32> {
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let digit = |c: char| match c {
        '一' => Some(1),
        '二' | '两' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => None,
    };
    let chars: Vec<char> = s.chars().collect();
    match chars.as_slice() {
        [c] if *c == '十' => Some(10),
        [c] => digit(*c),
        ['十', u] => digit(*u).map(|u| 10 + u),
        [t, '十'] => digit(*t).map(|t| t * 10),
        [t, '十', u] => Some(digit(*t)? * 10 + digit(*u)?),
        _ => None,
    }
}

fn days_of(caps: &Captures<'_>) -> Option<u32> {
    caps.name("days")
        .and_then(|m| parse_count(m.as_str()))
        .filter(|days| *days <= MAX_TRIP_DAYS)
}

/// Rule-based classifier for Chinese and English travel planning statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleClassifier;

impl RuleClassifier {
    /// Creates the classifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn duration(p: &SlotPatterns, text: &str) -> Option<SemanticSlot> {
        if p.total_marker.is_match(text) {
            let days = p.bare_days.captures(text).as_ref().and_then(days_of)?;
            return Some(SemanticSlot::new(
                SlotFamily::DurationTotal.as_str(),
                SlotFamily::DurationTotal,
                SlotValue::TotalDays {
                    days,
                    explicit: true,
                },
            ));
        }

        let place_days = p
            .place_days_en_trailing
            .captures(text)
            .or_else(|| p.place_days_en_leading.captures(text))
            .or_else(|| p.place_days_cjk.captures(text));
        if let Some(caps) = place_days {
            let place = caps
                .name("place")
                .map(|m| strip_stay_words(m.as_str()))
                .unwrap_or_default();
            if let Some(days) = days_of(&caps) {
                if !place.is_empty() && !TRIP_WORDS.contains(&place.as_str()) {
                    let place = normalize_place(&place);
                    return Some(SemanticSlot::new(
                        format!("{}:{place}", SlotFamily::DurationCity.as_str()),
                        SlotFamily::DurationCity,
                        SlotValue::PlaceDays { place, days },
                    ));
                }
            }
        }

        let days = p.bare_days.captures(text).as_ref().and_then(days_of)?;
        Some(SemanticSlot::new(
            SlotFamily::DurationTotal.as_str(),
            SlotFamily::DurationTotal,
            SlotValue::TotalDays {
                days,
                explicit: false,
            },
        ))
    }
}

fn strip_stay_words(place: &str) -> String {
    let mut place = place.trim();
    for prefix in ["在", "于", "stay in "] {
        place = place.strip_prefix(prefix).unwrap_or(place);
    }
    place.trim().to_string()
}

/// First money amount in `text` that belongs to the marker at `marker`.
///
/// A number counts when it carries a currency or scale unit, or sits right
/// next to the marker. Numbers followed by a day, month or headcount unit
/// never do.
fn amount_of(p: &SlotPatterns, text: &str, marker: (usize, usize)) -> Option<f64> {
    p.amount.captures_iter(text).find_map(|caps| {
        if caps.name("span").is_some() {
            return None;
        }
        let num = caps.name("num")?;
        let tagged = caps.name("symbol").is_some() || caps.name("unit").is_some() || caps.name("currency").is_some();
        let near = (num.start() >= marker.1 && num.start() - marker.1 <= MARKER_GAP)
            || (num.end() <= marker.0 && marker.0 - num.end() <= MARKER_GAP);
        if !tagged && !near {
            return None;
        }
        let value: f64 = num.as_str().parse().ok()?;
        let scale = match caps.name("unit").map(|m| m.as_str()) {
            Some("万" | "w") => 10_000.0,
            Some("千" | "k") => 1_000.0,
            _ => 1.0,
        };
        Some(value * scale)
    })
}

impl SlotClassifier for RuleClassifier {
    fn classify(&self, node: &Node) -> Option<SemanticSlot> {
        let text = node.statement.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        if node.node_type == NodeType::Goal {
            return Some(SemanticSlot::new("goal", SlotFamily::Goal, SlotValue::None));
        }
        let p = patterns()?;

        if let Some(marker) = marker_span(&text, REMAINING_BUDGET_MARKERS) {
            let value = amount_of(p, &text, marker).map_or(SlotValue::None, |amount| SlotValue::Amount { amount });
            return Some(SemanticSlot::new(
                SlotFamily::BudgetRemaining.as_str(),
                SlotFamily::BudgetRemaining,
                value,
            ));
        }

        if let Some(marker) = p.budget_marker.find(&text) {
            match amount_of(p, &text, (marker.start(), marker.end())) {
                Some(amount) => {
                    return Some(SemanticSlot::new(
                        SlotFamily::Budget.as_str(),
                        SlotFamily::Budget,
                        SlotValue::Amount { amount },
                    ))
                }
                // "spend 3 days in milan" is a stay, not a budget.
                None if p.bare_days.is_match(&text) => {}
                None => {
                    return Some(SemanticSlot::new(
                        slot_key(SlotFamily::Budget, &text),
                        SlotFamily::Budget,
                        SlotValue::None,
                    ))
                }
            }
        }

        if let Some(caps) = p.destination.captures(&text) {
            let place = caps.name("place").map(|m| m.as_str()).unwrap_or_default();
            let place = normalize_place(place);
            return Some(SemanticSlot::new(
                format!("{}:{place}", SlotFamily::Destination.as_str()),
                SlotFamily::Destination,
                SlotValue::Place { place },
            ));
        }

        if p.date.is_match(&text) {
            return Some(SemanticSlot::new(SlotFamily::Date.as_str(), SlotFamily::Date, SlotValue::None));
        }

        if let Some(slot) = Self::duration(p, &text) {
            return Some(slot);
        }

        if p.people_count.is_match(&text) || contains_any(&text, PEOPLE_MARKERS) {
            return Some(SemanticSlot::new(SlotFamily::People.as_str(), SlotFamily::People, SlotValue::None));
        }

        if let Some((label, _)) = LIMITING_FACTORS
            .iter()
            .find(|(_, markers)| contains_any(&text, markers))
        {
            return Some(SemanticSlot::new(
                format!("{}:{label}:{}", SlotFamily::LimitingFactor.as_str(), normalize_text(&text)),
                SlotFamily::LimitingFactor,
                SlotValue::Label {
                    label: (*label).to_string(),
                },
            ));
        }

        for (family, markers) in [
            (SlotFamily::Lodging, LODGING_MARKERS),
            (SlotFamily::Transport, TRANSPORT_MARKERS),
            (SlotFamily::Activity, ACTIVITY_MARKERS),
        ] {
            if contains_any(&text, markers) {
                return Some(SemanticSlot::new(slot_key(family, &text), family, SlotValue::None));
            }
        }

        let family = if node.node_type == NodeType::Preference || node.layer == Some(NodeLayer::Preference) {
            SlotFamily::Preference
        } else {
            SlotFamily::Generic
        };
        Some(SemanticSlot::new(slot_key(family, &text), family, SlotValue::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(node_type: NodeType, statement: &str) -> SemanticSlot {
        RuleClassifier::new()
            .classify(&Node::new("n", node_type, statement))
            .unwrap()
    }

    #[test]
    fn test_patterns_compile() {
        assert!(patterns().is_some());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("三"), Some(3));
        assert_eq!(parse_count("十"), Some(10));
        assert_eq!(parse_count("十二"), Some(12));
        assert_eq!(parse_count("二十"), Some(20));
        assert_eq!(parse_count("两"), Some(2));
        assert_eq!(parse_count("百"), None);
    }

    #[test]
    fn test_goal() {
        let slot = classify(NodeType::Goal, "Plan a trip");
        assert_eq!(slot.key, "goal");
        assert_eq!(slot.family, SlotFamily::Goal);
    }

    #[test]
    fn test_destination() {
        let slot = classify(NodeType::Fact, "目的地：米兰");
        assert_eq!(slot.key, "destination:米兰");
        assert_eq!(slot.value.place(), Some("米兰"));

        let slot = classify(NodeType::Fact, "Destination: Milan");
        assert_eq!(slot.key, "destination:milan");
    }

    #[test]
    fn test_durations() {
        let slot = classify(NodeType::Fact, "米兰3天");
        assert_eq!(slot.family, SlotFamily::DurationCity);
        assert_eq!(slot.key, "duration_city:米兰");
        assert_eq!(slot.value.days(), Some(3));

        let slot = classify(NodeType::Fact, "在罗马待两天");
        assert_eq!(slot.key, "duration_city:罗马");
        assert_eq!(slot.value.days(), Some(2));

        let slot = classify(NodeType::Fact, "2 days in Milan");
        assert_eq!(slot.key, "duration_city:milan");

        let slot = classify(NodeType::Constraint, "总共10天");
        assert_eq!(
            slot.value,
            SlotValue::TotalDays {
                days: 10,
                explicit: true
            }
        );

        let slot = classify(NodeType::Fact, "行程10天");
        assert_eq!(
            slot.value,
            SlotValue::TotalDays {
                days: 10,
                explicit: false
            }
        );
    }

    #[test]
    fn test_budget_and_remaining() {
        let slot = classify(NodeType::Constraint, "budget ≤ 10000");
        assert_eq!(slot.key, "budget");
        assert_eq!(slot.value, SlotValue::Amount { amount: 10000.0 });

        let slot = classify(NodeType::Constraint, "预算1.5万");
        assert_eq!(slot.value, SlotValue::Amount { amount: 15000.0 });

        let slot = classify(NodeType::Preference, "budget preference: luxury lodging");
        assert_eq!(slot.family, SlotFamily::Budget);
        assert_eq!(slot.key, "budget:budget preference luxury lodging");

        let slot = classify(NodeType::Fact, "剩余预算3000");
        assert_eq!(slot.family, SlotFamily::BudgetRemaining);
        assert_eq!(slot.value, SlotValue::Amount { amount: 3000.0 });
    }

    #[test]
    fn test_budget_amount_needs_unit_or_marker() {
        let slot = classify(NodeType::Fact, "Spend 3 days in Milan");
        assert_eq!(slot.family, SlotFamily::DurationCity);
        assert_eq!(slot.key, "duration_city:milan");
        assert_eq!(slot.value.days(), Some(3));

        let slot = classify(NodeType::Constraint, "we can spend 3000 yuan on hotels");
        assert_eq!(slot.key, "budget");
        assert_eq!(slot.value, SlotValue::Amount { amount: 3000.0 });

        let slot = classify(NodeType::Constraint, "flights for 2 people cost ¥8000");
        assert_eq!(slot.value, SlotValue::Amount { amount: 8000.0 });

        // Substrings of longer words are not budget markers.
        let slot = classify(NodeType::Preference, "costume museum in Milan");
        assert_eq!(slot.family, SlotFamily::Activity);

        let slot = classify(NodeType::Preference, "spend less on hotels");
        assert_eq!(slot.key, "budget:spend less on hotels");
    }

    #[test]
    fn test_implausible_day_counts_are_not_durations() {
        let slot = classify(NodeType::Fact, "米兰4000000000天");
        assert!(!matches!(slot.family, SlotFamily::DurationCity | SlotFamily::DurationTotal));
        assert_eq!(slot.value.days(), None);

        let slot = classify(NodeType::Constraint, "总共400天");
        assert_ne!(slot.family, SlotFamily::DurationTotal);

        assert_eq!(classify(NodeType::Constraint, "总共365天").value.days(), Some(365));
    }

    #[test]
    fn test_limiting_factor() {
        let slot = classify(NodeType::Constraint, "父亲有心脏病");
        assert_eq!(slot.family, SlotFamily::LimitingFactor);
        assert_eq!(slot.value, SlotValue::Label { label: "health".to_string() });
    }

    #[test]
    fn test_people_date_and_fallbacks() {
        assert_eq!(classify(NodeType::Fact, "3人出行").family, SlotFamily::People);
        assert_eq!(classify(NodeType::Fact, "5月1日出发").family, SlotFamily::Date);
        assert_eq!(classify(NodeType::Preference, "住四星酒店").family, SlotFamily::Lodging);
        assert_eq!(classify(NodeType::Preference, "Quiet neighbourhoods").family, SlotFamily::Preference);
        assert_eq!(classify(NodeType::Fact, "Italy is in Europe").family, SlotFamily::Generic);
    }
}
