use crate::common_scraper::RecordSource;
use crate::models::{Listing, RawBusiness};
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const ENTRY_PREFIX: &str = "json:";

/// Raw records read from a JSON array on disk instead of the live site.
/// Useful for offline runs and re-importing earlier captures.
///
/// Listings are keyed by array position (`json:<index>`), so repeated
/// captures of one place are each delivered in file order. The record's own
/// `maps_url` stays in the raw data.
pub struct JsonFileSource {
    entries: Vec<(Listing, RawBusiness)>,
}

impl JsonFileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        let value: Value = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse JSON from {}", path.display()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            anyhow::bail!("Expected a JSON array of business objects");
        };

        let mut entries = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let Value::Object(raw) = item else {
                anyhow::bail!("Entry {} is not a JSON object", index);
            };

            let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
            let listing = Listing {
                name: text("name"),
                category: text("category"),
                maps_url: format!("{}{}", ENTRY_PREFIX, index),
            };
            entries.push((listing, raw));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> &str {
        "JSON file"
    }

    fn search(&self, _query: &str, max_results: usize) -> Result<Vec<Listing>> {
        Ok(self
            .entries
            .iter()
            .take(max_results)
            .map(|(listing, _)| listing.clone())
            .collect())
    }

    fn fetch_details(&self, listing: &Listing) -> Result<RawBusiness> {
        listing
            .maps_url
            .strip_prefix(ENTRY_PREFIX)
            .and_then(|index| index.parse::<usize>().ok())
            .and_then(|index| self.entries.get(index))
            .map(|(_, raw)| raw.clone())
            .with_context(|| format!("No record for {}", listing.maps_url))
    }
}
