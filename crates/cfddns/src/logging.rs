//! Logging setup
//!
//! Every event goes to stderr and is appended to the log file, both with a
//! local timestamp and a level marker.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable selecting the log level
pub const LOG_LEVEL_VAR: &str = "CFDDNS_LOG_LEVEL";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a log level name
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber
pub fn init(log_path: &Path, level: Level) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()));

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to set tracing subscriber")?;

    Ok(())
}
