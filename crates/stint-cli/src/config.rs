//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// User all commands act as. The tracker scopes every record by
    /// user; a real deployment would get this from an identity provider.
    pub user: String,

    /// Reporting timezone as minutes east of UTC. Calendar bucketing
    /// (streak days, daily history, date filters) uses this offset.
    pub utc_offset_minutes: i32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("user", &self.user)
            .field("utc_offset_minutes", &self.utc_offset_minutes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("stint.db"),
            user: "default".to_string(),
            utc_offset_minutes: 0,
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

        // Load from environment variables (STINT_*)
        figment = figment.merge(Env::prefixed("STINT_"));

        figment.extract()
    }

    /// The configured reporting offset, when it denotes a valid timezone.
    pub fn reporting_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }
}

/// Returns the platform-specific config directory for stint.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stint"))
}

/// Returns the platform-specific data directory for stint.
///
/// On Linux: `~/.local/share/stint`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("stint"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_data_dir_for_db() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("stint.db"));
        assert_eq!(config.user, "default");
        assert_eq!(config.utc_offset_minutes, 0);
    }

    #[test]
    fn reporting_offset_converts_minutes() {
        let config = Config {
            utc_offset_minutes: 120,
            ..Config::default()
        };
        assert_eq!(
            config.reporting_offset(),
            FixedOffset::east_opt(2 * 3600)
        );
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let config = Config {
            utc_offset_minutes: 24 * 60,
            ..Config::default()
        };
        assert!(config.reporting_offset().is_none());
    }
}
