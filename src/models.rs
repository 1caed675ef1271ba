use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed city for the metropolitan area being crawled.
pub const TARGET_CITY: &str = "Ciudad de México";

/// Raw fields as observed by a collection driver. Values may be strings,
/// numbers or null depending on where they came from.
pub type RawBusiness = Map<String, Value>;

/// A search result stub, before its detail page has been fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub name: Option<String>,
    pub category: Option<String>,
    pub maps_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub place_id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub has_website: bool,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub city: String,
    pub category: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub maps_url: String,
    pub prospect_priority: u8,
    pub raw_data: Value,
}

impl BusinessRecord {
    /// Name to show in logs and progress lines.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.place_id)
    }

    pub fn has_direct_contact(&self) -> bool {
        self.phone.is_some() || self.email.is_some()
    }

    pub fn to_csv_record(&self) -> Vec<String> {
        fn opt(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }

        vec![
            self.place_id.clone(),
            opt(&self.name),
            opt(&self.phone),
            opt(&self.email),
            opt(&self.website),
            self.has_website.to_string(),
            opt(&self.address),
            opt(&self.neighborhood),
            self.city.clone(),
            opt(&self.category),
            self.rating.map(|r| r.to_string()).unwrap_or_default(),
            self.review_count.map(|c| c.to_string()).unwrap_or_default(),
            self.maps_url.clone(),
            self.prospect_priority.to_string(),
        ]
    }
}

/// The durable copy of a record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: i64,
    pub record: BusinessRecord,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl PersistedRecord {
    /// True when the last write created the row rather than updating it.
    pub fn was_inserted(&self) -> bool {
        self.created_at == self.last_updated
    }
}
