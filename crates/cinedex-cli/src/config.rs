//! Application configuration.
//!
//! Reads and writes the TOML file holding the TMDB credentials, search
//! behavior and listing defaults.

#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cinedex_api::tmdb::DEFAULT_LANGUAGE;
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable holding the TMDB API read access token.
pub const API_TOKEN_ENV: &str = "TMDB_API_TOKEN";

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Returns `{dir}/config.toml`, or `~/.config/cinedex/config.toml` without `dir`.
///
/// # Errors
///
/// Returns an error if `dir` is `None` and `HOME` is not set.
pub fn resolve_config_path(dir: Option<&Path>) -> Result<PathBuf> {
    let base = match dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            let home = std::env::var("HOME").context("HOME environment variable is not set")?;
            PathBuf::from(home).join(".config").join("cinedex")
        }
    };
    Ok(base.join(CONFIG_FILE))
}

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB API settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Search behavior.
    #[serde(default)]
    pub search: SearchConfig,
    /// Trending listing settings.
    #[serde(default)]
    pub trending: TrendingConfig,
}

/// TMDB API configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TmdbConfig {
    /// API base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API read access token (`TMDB_API_TOKEN` takes precedence).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Default response language.
    pub language: String,
    /// Minimum interval between requests in milliseconds.
    pub min_interval_ms: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            language: String::from(DEFAULT_LANGUAGE),
            min_interval_ms: 25,
        }
    }
}

/// Search configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet window before typed input is searched, in milliseconds.
    pub debounce_ms: u64,
    /// Record settled searches in the local metrics store.
    pub record: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            record: true,
        }
    }
}

/// Trending listing configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrendingConfig {
    /// Number of terms to list.
    pub limit: u32,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Returns the API token from `TMDB_API_TOKEN`, falling back to the config file.
    pub fn api_token(&self) -> Option<String> {
        choose_api_token(std::env::var(API_TOKEN_ENV).ok(), self.tmdb.api_token.as_deref())
    }

    /// Parses the base URL override.
    ///
    /// # Errors
    ///
    /// Returns an error if `tmdb.base_url` is set but not a valid URL.
    pub fn base_url(&self) -> Result<Option<Url>> {
        self.tmdb
            .base_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid tmdb.base_url: {raw}")))
            .transpose()
    }

    /// Returns the minimum request interval.
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.tmdb.min_interval_ms)
    }

    /// Returns the search debounce window.
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}

/// Picks the first non-blank token, environment first.
fn choose_api_token(env: Option<String>, configured: Option<&str>) -> Option<String> {
    env.filter(|t| !t.trim().is_empty())
        .or_else(|| configured.filter(|t| !t.trim().is_empty()).map(String::from))
}
