use anyhow::{Context, Result};
use regex::Regex;

/// Collapse runs of whitespace (including the non-breaking spaces the maps UI
/// sprinkles around) into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}' || c == '\u{202f}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a rating such as "4,5" or "4.5" into a value in `0.0..=5.0`.
/// A leading minus sign is kept, so negative ratings are out of range.
pub fn parse_rating(text: &str) -> Result<f64> {
    let re = Regex::new(r"-?\s*\d+(?:[.,]\d+)?").unwrap();
    let found = re.find(text).context("Rating not found in text")?;

    let rating = found
        .as_str()
        .replace(',', ".")
        .replace(char::is_whitespace, "")
        .parse::<f64>()
        .context("Failed to parse rating as number")?;

    if !(0.0..=5.0).contains(&rating) {
        anyhow::bail!("Rating {} out of range", rating);
    }

    Ok(rating)
}

/// Parse a review count such as "(1.234)" or "1,234 reseñas" by keeping
/// only its digits. Negative counts are rejected.
pub fn parse_review_count(text: &str) -> Result<u32> {
    let negative_re = Regex::new(r"^[^\d]*-\s*\d").unwrap();
    if negative_re.is_match(text) {
        anyhow::bail!("Negative review count: {}", text.trim());
    }

    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        anyhow::bail!("Review count not found in text");
    }

    digits
        .parse::<u32>()
        .context("Failed to parse review count as number")
}

/// Pull the place identifier out of a maps URL.
///
/// Prefers an explicit `placeid=` query parameter and falls back to the
/// `!1s0x…:0x…` feature id embedded in place URLs.
pub fn extract_place_id(url: &str) -> Option<String> {
    let param_re = Regex::new(r"[?&](?:placeid|place_id)=([^&#]+)").unwrap();
    if let Some(captures) = param_re.captures(url) {
        return captures.get(1).map(|m| m.as_str().to_string());
    }

    let feature_re = Regex::new(r"!1s(0x[0-9a-fA-F]+:0x[0-9a-fA-F]+)").unwrap();
    feature_re
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Strip a label like "Teléfono:" from a detail row and return the value.
pub fn strip_label(text: &str, label: &str) -> Option<String> {
    if !text.contains(label) {
        return None;
    }
    let value = clean_text(&text.replace(label, ""));
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
