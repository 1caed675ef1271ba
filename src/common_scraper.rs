use crate::error::{StoreError, ValidationError};
use crate::models::{Listing, PersistedRecord, RawBusiness};
use crate::normalizer;
use crate::store::BusinessStore;
use crate::tui::ScraperTUI;
use anyhow::Result;
use std::time::Duration;
use tracing::{error, info, warn};

pub const DEFAULT_QUERY: &str = "negocios en Gustavo A. Madero, Ciudad de México";

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub query: String,
    pub max_results: usize,
    pub delay: Duration,
    pub show_tui: bool,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            max_results: 10,
            delay: Duration::from_secs(3),
            show_tui: true,
        }
    }
}

/// Where raw business records come from.
pub trait RecordSource {
    fn name(&self) -> &str;
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<Listing>>;
    fn fetch_details(&self, listing: &Listing) -> Result<RawBusiness>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_in_store: usize,
}

impl RunSummary {
    pub fn saved(&self) -> usize {
        self.inserted + self.updated
    }
}

/// What happened to a single listing.
#[derive(Debug)]
pub enum RecordOutcome {
    Saved(PersistedRecord),
    Skipped(ValidationError),
    FetchFailed(anyhow::Error),
    StoreFailed(StoreError),
}

/// Search, then collect, normalize, score and persist each listing in turn.
///
/// A failure on one listing is logged and counted; it never stops the run.
/// Only a failed search or an unreadable store aborts.
pub fn run_pipeline<T: RecordSource, S: BusinessStore>(
    source: &T,
    store: &mut S,
    options: &ScrapingOptions,
) -> Result<RunSummary> {
    let mut tui = options.show_tui.then(ScraperTUI::new);

    info!("Searching {} for {:?}", source.name(), options.query);
    if let Some(tui) = tui.as_mut() {
        tui.start_search(source.name(), &options.query)?;
    }

    let mut listings = source.search(&options.query, options.max_results)?;
    listings.truncate(options.max_results);
    info!("{} results found, extracting details", listings.len());

    let mut summary = RunSummary {
        found: listings.len(),
        ..RunSummary::default()
    };

    if let Some(tui) = tui.as_mut() {
        tui.finish_search(listings.len())?;
        for listing in &listings {
            tui.add_listing(listing_label(listing))?;
        }
        tui.show_initial_progress_bar()?;
    }

    for (index, listing) in listings.iter().enumerate() {
        info!("[{}/{}] Processing {}", index + 1, listings.len(), listing.maps_url);
        update_display(&mut tui, |tui| tui.start_listing(index));

        match process_listing(source, store, listing) {
            RecordOutcome::Saved(persisted) => {
                if persisted.was_inserted() {
                    summary.inserted += 1;
                } else {
                    summary.updated += 1;
                }
                info!(
                    place_id = %persisted.record.place_id,
                    priority = persisted.record.prospect_priority,
                    "Saved {}",
                    persisted.record.display_name()
                );
                let priority = persisted.record.prospect_priority;
                update_display(&mut tui, |tui| tui.complete_listing(index, priority));
            }
            RecordOutcome::Skipped(e) => {
                summary.skipped += 1;
                warn!("Skipping {}: {}", listing.maps_url, e);
                update_display(&mut tui, |tui| tui.skip_listing(index));
            }
            RecordOutcome::FetchFailed(e) => {
                summary.failed += 1;
                error!("Error fetching {}: {:#}", listing.maps_url, e);
                update_display(&mut tui, |tui| tui.fail_listing(index));
            }
            RecordOutcome::StoreFailed(e) => {
                summary.failed += 1;
                error!("Error saving {}: {}", listing.maps_url, e);
                update_display(&mut tui, |tui| tui.fail_listing(index));
            }
        }

        // Keep a fixed gap between detail fetches
        if index + 1 < listings.len() && !options.delay.is_zero() {
            std::thread::sleep(options.delay);
        }
    }

    summary.total_in_store = store.count()?;
    info!(
        "Run finished: {} inserted, {} updated, {} skipped, {} failed",
        summary.inserted, summary.updated, summary.skipped, summary.failed
    );

    update_display(&mut tui, |tui| tui.show_final_summary(&summary));

    Ok(summary)
}

pub fn process_listing<T: RecordSource, S: BusinessStore>(
    source: &T,
    store: &mut S,
    listing: &Listing,
) -> RecordOutcome {
    let raw = match source.fetch_details(listing) {
        Ok(raw) => raw,
        Err(e) => return RecordOutcome::FetchFailed(e),
    };

    let record = match normalizer::normalize(&raw) {
        Ok(record) => record,
        Err(e) => return RecordOutcome::Skipped(e),
    };

    match store.upsert(&record) {
        Ok(persisted) => RecordOutcome::Saved(persisted),
        Err(e) => RecordOutcome::StoreFailed(e),
    }
}

/// Progress display failures inside the loop are logged; the batch goes on.
fn update_display<F>(tui: &mut Option<ScraperTUI>, update: F)
where
    F: FnOnce(&mut ScraperTUI) -> std::io::Result<()>,
{
    if let Some(tui) = tui.as_mut() {
        if let Err(e) = update(tui) {
            warn!("Progress display error: {}", e);
        }
    }
}

fn listing_label(listing: &Listing) -> String {
    listing
        .name
        .clone()
        .unwrap_or_else(|| listing.maps_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn display_errors_are_logged_not_returned() {
        let mut tui = Some(ScraperTUI::new());
        let mut called = false;
        update_display(&mut tui, |_| {
            called = true;
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
        });
        assert!(called);
        assert!(tui.is_some());
    }

    #[test]
    fn display_updates_are_skipped_without_a_display() {
        let mut tui: Option<ScraperTUI> = None;
        update_display(&mut tui, |_| panic!("no display to update"));
    }

    #[test]
    fn listing_label_falls_back_to_url() {
        let listing = Listing {
            name: None,
            category: None,
            maps_url: "https://m/p1".to_string(),
        };
        assert_eq!(listing_label(&listing), "https://m/p1");
    }
}
