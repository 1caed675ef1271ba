use anyhow::{anyhow, Result};
use prospectfinder::common_scraper::{process_listing, run_pipeline, RecordOutcome, RecordSource, ScrapingOptions};
use prospectfinder::json_source::JsonFileSource;
use prospectfinder::{
    BusinessRecord, BusinessStore, Listing, PersistedRecord, RawBusiness, SqliteStore, StoreError,
    ValidationError,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::time::Duration;

/// Serves canned detail pages and remembers which ones were requested.
struct FakeSource {
    pages: Vec<(Listing, Option<Value>)>,
    fetched: RefCell<Vec<String>>,
}

impl FakeSource {
    fn new(pages: Vec<(&str, Option<Value>)>) -> Self {
        let pages = pages
            .into_iter()
            .map(|(url, raw)| {
                let listing = Listing {
                    name: raw
                        .as_ref()
                        .and_then(|r| r.get("name"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    category: None,
                    maps_url: url.to_string(),
                };
                (listing, raw)
            })
            .collect();
        Self {
            pages,
            fetched: RefCell::new(Vec::new()),
        }
    }
}

impl RecordSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    fn search(&self, _query: &str, max_results: usize) -> Result<Vec<Listing>> {
        Ok(self.pages.iter().take(max_results).map(|(l, _)| l.clone()).collect())
    }

    fn fetch_details(&self, listing: &Listing) -> Result<RawBusiness> {
        self.fetched.borrow_mut().push(listing.maps_url.clone());
        let (_, raw) = self
            .pages
            .iter()
            .find(|(l, _)| l.maps_url == listing.maps_url)
            .ok_or_else(|| anyhow!("unknown listing"))?;
        match raw {
            Some(Value::Object(map)) => Ok(map.clone()),
            _ => Err(anyhow!("page did not load")),
        }
    }
}

/// SQLite store that refuses writes for one place id.
struct RejectingStore {
    inner: SqliteStore,
    reject: &'static str,
}

impl BusinessStore for RejectingStore {
    fn upsert(&mut self, record: &BusinessRecord) -> Result<PersistedRecord, StoreError> {
        if record.place_id == self.reject {
            return Err(StoreError::Database(rusqlite::Error::QueryReturnedNoRows));
        }
        self.inner.upsert(record)
    }

    fn find(&self, place_id: &str) -> Result<Option<PersistedRecord>, StoreError> {
        self.inner.find(place_id)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.inner.count()
    }

    fn all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        self.inner.all()
    }
}

fn quiet_options(max_results: usize) -> ScrapingOptions {
    ScrapingOptions {
        max_results,
        delay: Duration::ZERO,
        show_tui: false,
        ..ScrapingOptions::default()
    }
}

#[test]
fn bad_records_do_not_abort_the_batch() {
    let source = FakeSource::new(vec![
        ("u1", Some(json!({ "place_id": "p1", "name": "Tacos El Güero", "phone": "555" }))),
        ("u2", Some(json!({ "name": "Sin place_id" }))),
        ("u3", None),
        ("u4", Some(json!({ "place_id": "p4", "name": "Hotel Tepeyac", "website": "https://ht.mx" }))),
    ]);
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_pipeline(&source, &mut store, &quiet_options(10)).unwrap();

    assert_eq!(summary.found, 4);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total_in_store, 2);
    assert_eq!(*source.fetched.borrow(), vec!["u1", "u2", "u3", "u4"]);

    let hotel = store.find("p4").unwrap().unwrap();
    assert!(hotel.record.has_website);
    assert_eq!(hotel.record.prospect_priority, 1);
}

#[test]
fn rerunning_updates_instead_of_duplicating() {
    let first = FakeSource::new(vec![(
        "u1",
        Some(json!({ "place_id": "p1", "name": "Spa Lindavista", "category": "Spa", "rating": "4,8", "review_count": "(12)" })),
    )]);
    let second = FakeSource::new(vec![(
        "u1",
        Some(json!({ "place_id": "p1", "name": "Spa Lindavista", "website": "https://spa.mx" })),
    )]);
    let mut store = SqliteStore::open_in_memory().unwrap();

    run_pipeline(&first, &mut store, &quiet_options(10)).unwrap();
    let before = store.find("p1").unwrap().unwrap();
    assert_eq!(before.record.prospect_priority, 4);

    let summary = run_pipeline(&second, &mut store, &quiet_options(10)).unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(store.count().unwrap(), 1);

    let after = store.find("p1").unwrap().unwrap();
    assert_eq!(after.record.website.as_deref(), Some("https://spa.mx"));
    assert_eq!(after.record.rating, None);
    assert_eq!(after.record.prospect_priority, 1);
    assert!(after.last_updated > before.last_updated);
}

#[test]
fn respects_result_limit() {
    let source = FakeSource::new(vec![
        ("u1", Some(json!({ "place_id": "p1" }))),
        ("u2", Some(json!({ "place_id": "p2" }))),
        ("u3", Some(json!({ "place_id": "p3" }))),
    ]);
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_pipeline(&source, &mut store, &quiet_options(2)).unwrap();
    assert_eq!(summary.found, 2);
    assert_eq!(store.count().unwrap(), 2);
    assert!(store.find("p3").unwrap().is_none());
}

#[test]
fn missing_place_id_produces_no_write() {
    let source = FakeSource::new(vec![("u1", Some(json!({ "name": "Sin clave", "phone": "555" })))]);
    let mut store = SqliteStore::open_in_memory().unwrap();

    let outcome = process_listing(&source, &mut store, &source.pages[0].0);
    assert!(matches!(
        outcome,
        RecordOutcome::Skipped(ValidationError::MissingField("place_id"))
    ));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn failed_write_is_counted_and_the_run_continues() {
    let source = FakeSource::new(vec![
        ("u1", Some(json!({ "place_id": "p1", "name": "Tlapalería Juárez" }))),
        ("u2", Some(json!({ "place_id": "p2", "name": "Cocina Doña Mary" }))),
    ]);
    let mut store = RejectingStore {
        inner: SqliteStore::open_in_memory().unwrap(),
        reject: "p1",
    };

    let outcome = process_listing(&source, &mut store, &source.pages[0].0);
    assert!(matches!(outcome, RecordOutcome::StoreFailed(StoreError::Database(_))));

    let summary = run_pipeline(&source, &mut store, &quiet_options(10)).unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.total_in_store, 1);
    assert!(store.find("p1").unwrap().is_none());
    assert!(store.find("p2").unwrap().is_some());
}

#[test]
fn later_capture_of_a_place_in_a_json_file_wins() {
    let source = JsonFileSource::from_value(json!([
        { "place_id": "p1", "name": "Old", "maps_url": "https://maps.example/p1" },
        { "place_id": "p1", "name": "New", "maps_url": "https://maps.example/p1" },
    ]))
    .unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();

    let summary = run_pipeline(&source, &mut store, &quiet_options(10)).unwrap();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.updated, 1);

    let saved = store.find("p1").unwrap().unwrap();
    assert_eq!(saved.record.name.as_deref(), Some("New"));
    assert_eq!(saved.record.maps_url, "https://maps.example/p1");
}
