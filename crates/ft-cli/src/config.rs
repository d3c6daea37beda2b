//! Configuration loading and management.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Address for the tab-ingestion and read-side HTTP surface.
    pub listen_addr: SocketAddr,

    /// Seconds between tracker ticks.
    pub track_interval_seconds: u64,

    /// Size of an aggregation window in minutes.
    pub bucket_minutes: u32,

    /// Maximum gap in seconds for same-label blocks to be merged on insert.
    pub merge_gap_seconds: i64,

    /// A tick counts as active when input occurred within this many seconds.
    pub idle_threshold_seconds: u64,

    /// Case-insensitive signatures of browsers that report tabs.
    pub tab_browsers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("ft.db"),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9432)),
            track_interval_seconds: 5,
            bucket_minutes: 5,
            merge_gap_seconds: 5,
            idle_threshold_seconds: 60,
            tab_browsers: vec!["firefox".to_string(), "mozilla".to_string()],
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (FT_*)
        figment = figment.merge(Env::prefixed("FT_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for ft.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ft"))
}

/// Returns the platform-specific data directory for ft.
///
/// On Linux: `~/.local/share/ft`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ft"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("ft.db"));
    }

    #[test]
    fn default_intervals_are_sane() {
        let config = Config::default();
        assert!(config.track_interval_seconds > 0);
        assert!(config.bucket_minutes > 0);
        assert!(config.merge_gap_seconds >= 0);
    }

    #[test]
    fn default_browser_signatures_cover_firefox() {
        let config = Config::default();
        assert!(config.tab_browsers.iter().any(|s| s == "firefox"));
        assert!(config.tab_browsers.iter().any(|s| s == "mozilla"));
    }
}
