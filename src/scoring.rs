//! Prospect priority scoring.
//!
//! A record's priority is the sum of the points of every rule it matches,
//! clamped to `1..=5`. Rules are plain data so the list can be inspected and
//! tested on its own.

use crate::models::BusinessRecord;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

/// Category terms that mark a business as a high-value prospect.
/// Matched case-insensitively as substrings of the category.
pub const HIGH_VALUE_CATEGORIES: &[&str] = &[
    "restaurant",
    "cafetería",
    "cafe",
    "clínica",
    "clinic",
    "consultorio",
    "spa",
    "escuela",
    "school",
    "tienda",
    "retail",
    "boutique",
    "gimnasio",
    "gym",
    "salón de belleza",
    "salon",
    "hotel",
];

const MIN_RATING: f64 = 4.0;
const MIN_REVIEWS: u32 = 10;

pub struct Rule {
    pub name: &'static str,
    pub points: u8,
    applies: fn(&BusinessRecord) -> bool,
}

impl Rule {
    pub fn applies(&self, record: &BusinessRecord) -> bool {
        (self.applies)(record)
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "no_website",
        points: 2,
        applies: |r| !r.has_website,
    },
    Rule {
        name: "direct_contact",
        points: 1,
        applies: |r| r.has_direct_contact(),
    },
    Rule {
        name: "high_value_category",
        points: 1,
        applies: |r| is_high_value_category(r.category.as_deref().unwrap_or("")),
    },
    Rule {
        name: "active_reviews",
        points: 1,
        applies: |r| match (r.rating, r.review_count) {
            (Some(rating), Some(count)) => rating >= MIN_RATING && count >= MIN_REVIEWS,
            _ => false,
        },
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub matched: Vec<&'static str>,
    pub raw_points: u32,
    pub priority: u8,
}

pub fn is_high_value_category(category: &str) -> bool {
    let category = category.to_lowercase();
    HIGH_VALUE_CATEGORIES.iter().any(|term| category.contains(term))
}

pub fn score_breakdown(record: &BusinessRecord) -> ScoreBreakdown {
    let (matched, raw_points) = RULES
        .iter()
        .filter(|rule| rule.applies(record))
        .fold((Vec::new(), 0u32), |(mut names, total), rule| {
            names.push(rule.name);
            (names, total + u32::from(rule.points))
        });

    let priority = raw_points.clamp(u32::from(MIN_PRIORITY), u32::from(MAX_PRIORITY)) as u8;

    ScoreBreakdown {
        matched,
        raw_points,
        priority,
    }
}

/// Priority in `1..=5`. Ignores the record's current `prospect_priority`.
pub fn score(record: &BusinessRecord) -> u8 {
    score_breakdown(record).priority
}
