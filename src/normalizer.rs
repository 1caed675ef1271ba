//! Turns raw scraped fields into a canonical `BusinessRecord`.
//!
//! Every optional field is populated independently: a value with the wrong
//! shape leaves that field unset instead of failing the whole record. Only a
//! missing `place_id` is an error.

use crate::error::ValidationError;
use crate::models::{BusinessRecord, RawBusiness, TARGET_CITY};
use crate::parser;
use crate::scoring;
use serde_json::Value;
use tracing::debug;

pub fn normalize(raw: &RawBusiness) -> Result<BusinessRecord, ValidationError> {
    let place_id = text_field(raw, "place_id").ok_or(ValidationError::MissingField("place_id"))?;

    let website = text_field(raw, "website");
    let address = text_field(raw, "address");
    let neighborhood =
        text_field(raw, "neighborhood").or_else(|| extract_neighborhood(address.as_deref()));

    let mut record = BusinessRecord {
        place_id,
        name: text_field(raw, "name"),
        phone: text_field(raw, "phone"),
        email: text_field(raw, "email"),
        has_website: website.is_some(),
        website,
        address,
        neighborhood,
        city: TARGET_CITY.to_string(),
        category: text_field(raw, "category"),
        rating: rating_field(raw, "rating"),
        review_count: count_field(raw, "review_count"),
        maps_url: text_field(raw, "maps_url").unwrap_or_default(),
        prospect_priority: scoring::MIN_PRIORITY,
        raw_data: Value::Object(raw.clone()),
    };

    let breakdown = scoring::score_breakdown(&record);
    debug!(
        place_id = %record.place_id,
        rules = ?breakdown.matched,
        priority = breakdown.priority,
        "Scored record"
    );
    record.prospect_priority = breakdown.priority;

    Ok(record)
}

/// Approximate the neighborhood ("colonia") as the third-from-last
/// comma-separated segment of an address.
pub fn extract_neighborhood(address: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = address?.split(',').collect();
    if parts.len() < 3 {
        return None;
    }

    let segment = parts[parts.len() - 3].trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

fn text_field(raw: &RawBusiness, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => {
            let cleaned = parser::clean_text(s);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => {
            debug!(field = key, value = %other, "Ignoring non-text value");
            None
        }
    }
}

fn rating_field(raw: &RawBusiness, key: &str) -> Option<f64> {
    let rating = match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match parser::parse_rating(s) {
            Ok(rating) => Some(rating),
            Err(e) => {
                debug!(field = key, value = %s, "Unparsable rating: {}", e);
                None
            }
        },
        _ => None,
    }?;

    if (0.0..=5.0).contains(&rating) {
        Some(rating)
    } else {
        debug!(field = key, rating, "Rating out of range");
        None
    }
}

fn count_field(raw: &RawBusiness, key: &str) -> Option<u32> {
    match raw.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|count| u32::try_from(count).ok()),
        Value::String(s) => match parser::parse_review_count(s) {
            Ok(count) => Some(count),
            Err(e) => {
                debug!(field = key, value = %s, "Unparsable review count: {}", e);
                None
            }
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawBusiness {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn missing_place_id_is_a_validation_error() {
        let input = raw(json!({ "name": "Tacos El Güero", "phone": "555" }));
        assert_eq!(
            normalize(&input).unwrap_err(),
            ValidationError::MissingField("place_id")
        );
    }

    #[test]
    fn blank_or_null_place_id_is_a_validation_error() {
        assert!(normalize(&raw(json!({ "place_id": "   " }))).is_err());
        assert!(normalize(&raw(json!({ "place_id": null }))).is_err());
    }

    #[test]
    fn derives_neighborhood_from_third_to_last_segment() {
        let input = raw(json!({
            "place_id": "p1",
            "address": "Calle X, Colonia Y, Ciudad Z, País W",
        }));
        let record = normalize(&input).unwrap();
        assert_eq!(record.neighborhood.as_deref(), Some("Ciudad Z"));
    }

    #[test]
    fn short_address_leaves_neighborhood_unset() {
        assert_eq!(extract_neighborhood(Some("Calle X, CDMX")), None);
        assert_eq!(extract_neighborhood(Some("Calle X")), None);
        assert_eq!(extract_neighborhood(None), None);
        assert_eq!(extract_neighborhood(Some(" , ,x")), None);
    }

    #[test]
    fn supplied_neighborhood_wins_over_address() {
        let input = raw(json!({
            "place_id": "p1",
            "neighborhood": "Lindavista",
            "address": "Av. Montevideo 363, Col. Guadalupe Tepeyac, 07840 CDMX, México",
        }));
        let record = normalize(&input).unwrap();
        assert_eq!(record.neighborhood.as_deref(), Some("Lindavista"));
    }

    #[test]
    fn has_website_is_recomputed_not_trusted() {
        let input = raw(json!({
            "place_id": "p1",
            "website": "",
            "has_website": true,
        }));
        let record = normalize(&input).unwrap();
        assert!(!record.has_website);
        assert_eq!(record.website, None);

        let input = raw(json!({
            "place_id": "p1",
            "website": "https://taqueria.mx",
            "has_website": false,
        }));
        assert!(normalize(&input).unwrap().has_website);
    }

    #[test]
    fn malformed_fields_are_left_unset() {
        let input = raw(json!({
            "place_id": "p1",
            "name": { "nested": true },
            "rating": "sin reseñas",
            "review_count": -3,
            "category": ["Restaurante"],
        }));
        let record = normalize(&input).unwrap();
        assert_eq!(record.name, None);
        assert_eq!(record.rating, None);
        assert_eq!(record.review_count, None);
        assert_eq!(record.category, None);
    }

    #[test]
    fn parses_textual_numbers() {
        let input = raw(json!({
            "place_id": "p1",
            "rating": "4,6",
            "review_count": "(1.024)",
            "phone": 5557812233u64,
        }));
        let record = normalize(&input).unwrap();
        assert_eq!(record.rating, Some(4.6));
        assert_eq!(record.review_count, Some(1024));
        assert_eq!(record.phone.as_deref(), Some("5557812233"));
    }

    #[test]
    fn negative_textual_numbers_are_left_unset() {
        let input = raw(json!({
            "place_id": "p1",
            "rating": "-4.5",
            "review_count": "-30",
        }));
        let record = normalize(&input).unwrap();
        assert_eq!(record.rating, None);
        assert_eq!(record.review_count, None);
    }

    #[test]
    fn out_of_range_rating_is_dropped() {
        let input = raw(json!({ "place_id": "p1", "rating": 9.5 }));
        assert_eq!(normalize(&input).unwrap().rating, None);
    }

    #[test]
    fn sets_city_priority_and_raw_data() {
        let input = raw(json!({
            "place_id": "p1",
            "website": "http://x.com",
            "phone": "555",
            "category": "Restaurante",
            "rating": 4.5,
            "review_count": 20,
            "maps_url": "https://maps.example/p1",
            "extra": "kept",
        }));
        let record = normalize(&input).unwrap();
        assert_eq!(record.city, TARGET_CITY);
        assert_eq!(record.prospect_priority, 3);
        assert_eq!(record.maps_url, "https://maps.example/p1");
        assert_eq!(record.raw_data["extra"], "kept");
        assert_eq!(record.raw_data, Value::Object(input));
    }
}
