//! Application settings
//!
//! Stored as pretty-printed JSON in `settings.json` under the user config
//! directory. Every field has a default, so a missing or partial file is
//! fine; an unreadable one falls back to the defaults with a warning.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;

pub use error::SettingsError;

use crate::remote::leaderboard::DEFAULT_LIMIT;
use crate::remote::timezone::DEFAULT_DISPLAY_ZONE;
use crate::remote::{DisplayZone, LookupTables, DEFAULT_BASE_URL};
use crate::storage::BackendKind;

/// Directory name under the platform config and data directories
pub const APP_DIR: &str = "RaceLedger";

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Driver whose races are fetched when none is given
pub const DEFAULT_DRIVER_ID: u64 = 819528;

/// Everything the user can configure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Which persistence backend holds the ledger
    pub backend: BackendKind,
    /// Where the ledger lives; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    /// Remote stats service
    pub remote: RemoteSettings,
    /// JSON file merged over the built-in car/series tables
    pub lookup_overrides: Option<PathBuf>,
}

/// Remote stats service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Service root URL
    pub base_url: String,
    /// Driver whose races are fetched
    pub driver_id: u64,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// IANA zone all timestamps are shown in
    pub display_timezone: String,
    /// Leaderboard snapshot file
    pub leaderboard_csv: Option<PathBuf>,
    /// Leaderboard rows shown
    pub leaderboard_limit: usize,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            driver_id: DEFAULT_DRIVER_ID,
            timeout_secs: 30,
            display_timezone: DEFAULT_DISPLAY_ZONE.to_string(),
            leaderboard_csv: None,
            leaderboard_limit: DEFAULT_LIMIT,
        }
    }
}

impl AppSettings {
    /// `<config dir>/RaceLedger/settings.json`, or under the home dir
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(SETTINGS_FILE)
    }

    /// Read settings from `path`, or defaults when it is missing or unreadable
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Ignoring settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Read settings from `path`, reporting why that failed
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write settings to `path`, creating its directory
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Directory holding the ledger store
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
    }

    /// The configured display zone
    pub fn display_zone(&self) -> Result<DisplayZone, SettingsError> {
        Ok(DisplayZone::from_name(&self.remote.display_timezone)?)
    }

    /// Request timeout, at least one second
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs.max(1))
    }

    /// Built-in tables, with the override file merged on top when configured
    pub fn lookup_tables(&self) -> Result<LookupTables, SettingsError> {
        match &self.lookup_overrides {
            Some(path) => Ok(LookupTables::load_overrides(path)?),
            None => Ok(LookupTables::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.backend, BackendKind::Sqlite);
        assert_eq!(settings.remote.driver_id, 819528);
        assert_eq!(settings.remote.leaderboard_limit, 30);
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.display_zone().unwrap(), DisplayZone::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"backend": "document", "remote": {"driver_id": 42}}"#).unwrap();

        let settings = AppSettings::load(&path);
        assert_eq!(settings.backend, BackendKind::Document);
        assert_eq!(settings.remote.driver_id, 42);
        assert_eq!(settings.remote.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_missing_or_broken_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        assert_eq!(AppSettings::load(&path), AppSettings::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load(&path), AppSettings::default());
        assert!(matches!(
            AppSettings::try_load(&path),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let mut settings = AppSettings::default();
        settings.data_dir = Some(dir.path().join("data"));
        settings.remote.display_timezone = "America/New_York".to_string();
        settings.save(&path).unwrap();

        let loaded = AppSettings::load(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.data_dir(), dir.path().join("data"));
    }

    #[test]
    fn test_bad_timezone() {
        let mut settings = AppSettings::default();
        settings.remote.display_timezone = "Nowhere/Special".to_string();
        assert!(matches!(
            settings.display_zone(),
            Err(SettingsError::Timezone(_))
        ));
    }
}
