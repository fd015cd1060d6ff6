//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::epg::ChannelFilter;
use crate::error::{EpgError, Result};

/// Environment variable pointing at an alternative config file
pub const CONFIG_ENV: &str = "EPG_GRAB_CONFIG";

/// Upper bound for `assumed_duration_minutes` (one day)
pub const MAX_ASSUMED_DURATION_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // Compressed feed
    pub feed_url: String,
    pub target_locale: String,
    pub id_suffix: Option<String>,
    pub feed_output: PathBuf,
    // JSON API
    pub api_base_url: String,
    pub api_country: String,
    pub api_output: PathBuf,
    // Page scraper
    pub scrape_listing_url: String,
    pub scrape_output: PathBuf,
    pub scrape_workers: usize,
    pub assumed_duration_minutes: i64,
    pub wait_timeout_secs: u64,
    pub poll_interval_ms: u64,
    // Network
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub user_agent: String,
    // Logging
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://github.com/fraudiay79/strm/raw/main/epg/epg-channels.xml.gz".to_string(),
            target_locale: "tr".to_string(),
            id_suffix: None,
            feed_output: PathBuf::from("tr-epg.xml"),
            api_base_url: "https://tvepg.eu".to_string(),
            api_country: "tr".to_string(),
            api_output: PathBuf::from("epg.xml"),
            scrape_listing_url: "https://www.tvyayinakisi.com/".to_string(),
            scrape_output: PathBuf::from("epg.xml"),
            scrape_workers: 4,
            assumed_duration_minutes: 60,
            wait_timeout_secs: 20,
            poll_interval_ms: 500,
            connect_timeout_secs: 30,
            read_timeout_secs: 120,
            user_agent: format!("epg_grab/{}", env!("CARGO_PKG_VERSION")),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("epg_grab");
        path.push("config.json");
        path
    }

    /// Load from `$EPG_GRAB_CONFIG` or the user config dir; defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| EpgError::io(path, e))?;
        let config: Self = serde_json::from_str(&content).map_err(|e| EpgError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if !(1..=MAX_ASSUMED_DURATION_MINUTES).contains(&self.assumed_duration_minutes) {
            return Err(EpgError::Config {
                path: path.to_path_buf(),
                message: format!(
                    "assumed_duration_minutes must be between 1 and {}, got {}",
                    MAX_ASSUMED_DURATION_MINUTES, self.assumed_duration_minutes
                ),
            });
        }
        Ok(())
    }

    /// Channel filter for the compressed feed
    pub fn feed_filter(&self) -> ChannelFilter {
        ChannelFilter {
            locale: Some(self.target_locale.clone()).filter(|l| !l.is_empty()),
            id_suffix: self.id_suffix.clone().filter(|s| !s.is_empty()),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Length given to scraped programmes, kept within `1..=MAX_ASSUMED_DURATION_MINUTES`
    pub fn assumed_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.assumed_duration_minutes.clamp(1, MAX_ASSUMED_DURATION_MINUTES))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}
