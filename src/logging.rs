use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "app.log";

pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "prospectfinder=debug,warn"
    } else {
        "prospectfinder=info,warn"
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the level. Console output goes to stderr and is
/// left off while the progress display owns the terminal. With `log_dir`,
/// every event is also appended to `<log_dir>/app.log`.
pub fn init_logging(debug: bool, console: bool, log_dir: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let console_layer = console.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE_NAME))
                .context("Failed to open log file")?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
