use anyhow::{Context, Result};
use clap::Parser;
use prospectfinder::logging;
use prospectfinder::store::{BusinessStore, SqliteStore};
use prospectfinder::utils;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Export stored prospects to CSV")]
struct Args {
    /// Path to the SQLite database
    #[clap(short, long, env = "PROSPECT_DB", default_value = "prospects.sqlite3")]
    database: PathBuf,

    /// Path to output CSV file
    #[clap(short, long, default_value = "prospects.csv")]
    output: PathBuf,

    /// Only export prospects with at least this priority (1-5)
    #[clap(short, long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=5))]
    min_priority: u8,

    /// Enable debug output
    #[clap(long)]
    debug: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    logging::init_logging(args.debug, true, None)?;

    let store = SqliteStore::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;

    let records = utils::filter_by_priority(store.all()?, args.min_priority);
    utils::save_prospects_to_csv(&records, &args.output)?;

    println!(
        "Exported {} prospects (priority >= {}) to {}",
        records.len(),
        args.min_priority,
        args.output.display()
    );

    Ok(())
}
