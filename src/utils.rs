use crate::models::PersistedRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::info;

pub const CSV_HEADER: &[&str] = &[
    "place_id",
    "name",
    "phone",
    "email",
    "website",
    "has_website",
    "address",
    "neighborhood",
    "city",
    "category",
    "rating",
    "review_count",
    "maps_url",
    "prospect_priority",
    "last_updated",
];

/// Keep only prospects at or above `min_priority`, preserving order.
pub fn filter_by_priority(records: Vec<PersistedRecord>, min_priority: u8) -> Vec<PersistedRecord> {
    records
        .into_iter()
        .filter(|p| p.record.prospect_priority >= min_priority)
        .collect()
}

pub fn save_prospects_to_csv(records: &[PersistedRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let path = output_path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CSV_HEADER)?;

    for persisted in records {
        let mut row = persisted.record.to_csv_record();
        row.push(persisted.last_updated.to_rfc3339());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Saved {} prospects to {}", records.len(), path.display());

    Ok(())
}
