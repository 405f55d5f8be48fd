//! Tracing subscriber setup
//!
//! Log output goes to a file so it never interleaves with the progress
//! display or a raw-mode session on the terminal.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, appending to `log_file_path`.
pub fn init_global(log_file_path: &Path, filter: &str) -> Result<()> {
    if let Some(dir) = log_file_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("Failed to open log file {}", log_file_path.display()))?;

    build_subscriber(log_file, filter)?
        .try_init()
        .context("Failed to install tracing subscriber")
}

/// Build a subscriber writing to `log_file`, filtered by `filter`.
pub fn build_subscriber(log_file: File, filter: &str) -> Result<impl tracing::Subscriber + Send + Sync> {
    let env_filter = EnvFilter::try_new(filter)
        .with_context(|| format!("Invalid log filter {filter:?}"))?;

    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(log_file));

    Ok(tracing_subscriber::registry().with(fmt_layer).with(env_filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_events_reach_log_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), "debug").unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("unrecognized progress item");
            tracing::trace!("below the filter");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("WARN"));
        assert!(contents.contains("unrecognized progress item"));
        assert!(!contents.contains("below the filter"));
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let log_file = NamedTempFile::new().unwrap();
        assert!(build_subscriber(log_file.reopen().unwrap(), "dockside=loud").is_err());
    }
}
