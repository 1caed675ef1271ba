use crate::common_scraper::RecordSource;
use crate::models::{Listing, RawBusiness};
use crate::parser;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const MAPS_BASE_URL: &str = "https://www.google.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const ADDRESS_LABEL: &str = "Dirección:";
const PHONE_LABEL: &str = "Teléfono:";
const WEBSITE_LABEL: &str = "Sitio web:";

/// Fields every detail pass reports, present or not.
const DETAIL_FIELDS: &[&str] = &[
    "maps_url",
    "place_id",
    "name",
    "phone",
    "email",
    "website",
    "address",
    "neighborhood",
    "category",
    "rating",
    "review_count",
];

pub struct MapsScraper {
    client: Client,
}

impl MapsScraper {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    fn fetch(&self, url: &str) -> Result<Html> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept-Language", "es-MX,es;q=0.9")
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Bad status for {}", url))?;

        let body = response.text().context("Failed to read response body")?;
        Ok(Html::parse_document(&body))
    }
}

impl RecordSource for MapsScraper {
    fn name(&self) -> &str {
        "Google Maps"
    }

    fn search(&self, query: &str, max_results: usize) -> Result<Vec<Listing>> {
        let document = self.fetch(&search_url(query))?;
        let listings = parse_search_results(&document, max_results);
        debug!("Found {} listings for {:?}", listings.len(), query);
        Ok(listings)
    }

    fn fetch_details(&self, listing: &Listing) -> Result<RawBusiness> {
        let document = self.fetch(&listing.maps_url)?;
        Ok(parse_business_details(&document, listing))
    }
}

pub fn search_url(query: &str) -> String {
    format!("{}/maps/search/{}?hl=es", MAPS_BASE_URL, urlencoding::encode(query))
}

fn absolute_url(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", MAPS_BASE_URL, href)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    parser::clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_text(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    scope
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Read the result cards of a search page. Cards without a link are skipped.
pub fn parse_search_results(document: &Html, max_results: usize) -> Vec<Listing> {
    let Ok(card_selector) = Selector::parse("div[role='article']") else {
        return Vec::new();
    };
    let Ok(link_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut listings: Vec<Listing> = Vec::new();
    for card in document.select(&card_selector) {
        if listings.len() >= max_results {
            break;
        }

        let Some(href) = card
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            debug!("Skipping result card without a link");
            continue;
        };

        let maps_url = absolute_url(href);
        if listings.iter().any(|l| l.maps_url == maps_url) {
            continue;
        }

        listings.push(Listing {
            name: first_text(card, "div.qBF1Pd"),
            category: first_text(card, "div.W4Efsd span[jscontroller]"),
            maps_url,
        });
    }

    listings
}

/// Extract whatever the detail page offers. Missing elements leave the
/// corresponding field null; the listing's own name and category are used
/// when the page does not repeat them.
pub fn parse_business_details(document: &Html, listing: &Listing) -> RawBusiness {
    let root = document.root_element();
    let mut raw: RawBusiness = DETAIL_FIELDS
        .iter()
        .map(|field| (field.to_string(), Value::Null))
        .collect();

    let mut set = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            raw.insert(key.to_string(), value);
        }
    };

    set("maps_url", Some(Value::from(listing.maps_url.clone())));
    set(
        "place_id",
        parser::extract_place_id(&listing.maps_url).map(Value::from),
    );
    set(
        "name",
        first_text(root, "h1.DUwDvf")
            .or_else(|| listing.name.clone())
            .map(Value::from),
    );
    set(
        "category",
        first_text(root, "button.DkEaL")
            .or_else(|| listing.category.clone())
            .map(Value::from),
    );

    let rows = detail_rows(document);
    set("address", labelled_value(&rows, ADDRESS_LABEL).map(Value::from));
    set("phone", labelled_value(&rows, PHONE_LABEL).map(Value::from));
    set("website", labelled_value(&rows, WEBSITE_LABEL).map(Value::from));
    set("email", extract_email(document).map(Value::from));

    let rating = first_text(root, "div.F7nice span span").and_then(|text| {
        parser::parse_rating(&text)
            .map_err(|e| debug!("Rating not usable ({:?}): {}", text, e))
            .ok()
    });
    set("rating", rating.map(Value::from));

    let review_count = first_text(root, "span.UY7F9").and_then(|text| {
        parser::parse_review_count(&text)
            .map_err(|e| debug!("Review count not usable ({:?}): {}", text, e))
            .ok()
    });
    set("review_count", review_count.map(Value::from));

    raw
}

fn detail_rows(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("div.QSFF4-text.gm2-body-2") else {
        return Vec::new();
    };
    document.select(&selector).map(element_text).collect()
}

fn labelled_value(rows: &[String], label: &str) -> Option<String> {
    rows.iter().find_map(|row| parser::strip_label(row, label))
}

fn extract_email(document: &Html) -> Option<String> {
    let selector = Selector::parse("a[href^='mailto:']").ok()?;
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim_start_matches("mailto:"))
        .map(|addr| addr.split('?').next().unwrap_or(addr).trim().to_string())
        .find(|addr| addr.contains('@'))
}
