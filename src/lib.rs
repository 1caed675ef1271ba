pub mod common_scraper;
pub mod error;
pub mod json_source;
pub mod logging;
pub mod maps_scraper;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod scoring;
pub mod store;
pub mod tui;
pub mod utils;

pub use error::{StoreError, ValidationError};
pub use models::{BusinessRecord, Listing, PersistedRecord, RawBusiness};
pub use normalizer::normalize;
pub use scoring::score;
pub use store::{BusinessStore, SqliteStore};
