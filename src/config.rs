//! Configuration management for dockside
//!
//! User preferences live in `~/.dockside/config.toml`. A missing file means
//! defaults; a present but unparsable file is an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::progress::{RenderOptions, DIGEST_PREFIX, FALLBACK_COLUMNS};

/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "DOCKSIDE_LOG";

/// dockside configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Width used for progress lines when the output is not a terminal
    #[serde(default = "default_fallback_columns")]
    pub fallback_columns: u16,

    /// Number of digest characters that identify a build step row
    #[serde(default = "default_digest_prefix")]
    pub digest_prefix: usize,

    /// Log filter directive, e.g. "info" or "dockside=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log file location; defaults to `~/.dockside/dockside.log`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_fallback_columns() -> u16 {
    FALLBACK_COLUMNS
}

fn default_digest_prefix() -> usize {
    DIGEST_PREFIX
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_columns: default_fallback_columns(),
            digest_prefix: default_digest_prefix(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

impl Config {
    /// Get config directory path (~/.dockside)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".dockside"))
    }

    /// Get config file path (~/.dockside/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location, or defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // Atomic write: write to temp file then rename
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, &contents)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to rename config file to {}", path.display()))?;

        Ok(())
    }

    /// Render options for the progress display; `columns` pins the width.
    pub fn render_options(&self, columns: Option<u16>) -> RenderOptions {
        RenderOptions {
            columns,
            fallback_columns: self.fallback_columns.max(1),
            digest_prefix: self.digest_prefix,
        }
    }

    /// Where log output goes
    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("dockside.log")),
        }
    }

    /// Log filter directive; `DOCKSIDE_LOG` wins over the config file
    pub fn log_filter(&self) -> String {
        Self::filter_from(std::env::var(LOG_ENV).ok(), &self.log_level)
    }

    fn filter_from(env: Option<String>, configured: &str) -> String {
        match env {
            Some(value) if !value.trim().is_empty() => value,
            _ => configured.to_string(),
        }
    }
}
