use anyhow::{Context, Result};
use clap::Parser;
use prospectfinder::common_scraper::{run_pipeline, ScrapingOptions, DEFAULT_QUERY};
use prospectfinder::json_source::JsonFileSource;
use prospectfinder::logging;
use prospectfinder::maps_scraper::MapsScraper;
use prospectfinder::store::SqliteStore;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Prospectfinder - Business prospect scraper for Ciudad de México")]
struct Args {
    /// Search query sent to the maps listing
    #[clap(short, long, default_value = DEFAULT_QUERY)]
    query: String,

    /// Maximum number of businesses to process
    #[clap(short, long, default_value = "10")]
    max_results: usize,

    /// Path to the SQLite database
    #[clap(short, long, env = "PROSPECT_DB", default_value = "prospects.sqlite3")]
    database: PathBuf,

    /// Read raw business records from a JSON array instead of scraping
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Pause between businesses, in milliseconds
    #[clap(long, env = "PROSPECT_DELAY_MS", default_value = "3000")]
    delay_ms: u64,

    /// Directory for the log file
    #[clap(long, env = "PROSPECT_LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Print log lines instead of the progress display
    #[clap(long)]
    no_tui: bool,

    /// Enable debug output
    #[clap(long)]
    debug: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    logging::init_logging(args.debug, args.no_tui, Some(args.log_dir.as_path()))?;

    let options = ScrapingOptions {
        query: args.query.clone(),
        max_results: args.max_results,
        delay: Duration::from_millis(args.delay_ms),
        show_tui: !args.no_tui,
    };

    let mut store = SqliteStore::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    info!("Using database {}", args.database.display());

    let summary = match &args.input {
        Some(path) => {
            let source = JsonFileSource::open(path)?;
            run_pipeline(&source, &mut store, &options)?
        }
        None => {
            info!("Initializing HTTP client...");
            let source = MapsScraper::new()?;
            run_pipeline(&source, &mut store, &options)?
        }
    };

    if args.no_tui {
        println!("\n=== Summary ===");
        println!("Businesses found: {}", summary.found);
        println!("Saved: {} ({} new, {} updated)", summary.saved(), summary.inserted, summary.updated);
        println!("Skipped without place_id: {}", summary.skipped);
        println!("Failed: {}", summary.failed);
        println!("Total businesses in database: {}", summary.total_in_store);
    }

    info!("Process finished");
    Ok(())
}
