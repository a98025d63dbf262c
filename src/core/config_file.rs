//! User configuration file handling
//!
//! Manages settings from ~/.config/fontshelf/settings.json

use crate::core::settings::IngestSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// User configuration from ~/.config/fontshelf/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Where the catalog is stored
    pub data_dir: Option<PathBuf>,
    /// Per-file size limit for ingestion
    pub max_file_size_mib: Option<u64>,
    /// Files parsed concurrently per batch
    pub batch_size: Option<usize>,
    /// Write logs to the logs directory instead of stderr
    pub log_to_file: Option<bool>,
}

impl ConfigFile {
    /// Get the path to the fontshelf config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("fontshelf")
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse settings.json: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read settings.json: {}", e);
                None
            }
        }
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Ingestion limits with this file's overrides applied
    pub fn ingest_settings(&self) -> IngestSettings {
        let mut settings = IngestSettings::default();
        if let Some(mib) = self.max_file_size_mib.filter(|mib| *mib > 0) {
            settings.set_max_file_size_mib(mib);
        }
        if let Some(batch_size) = self.batch_size.filter(|size| *size > 0) {
            settings.batch_size = batch_size;
        }
        settings
    }

    /// Initialize the complete user configuration directory
    ///
    /// This creates the ~/.config/fontshelf directory, its logs/
    /// subdirectory, and a settings.json file with default values.
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();
        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = crate::logging::logs_dir();
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            let defaults = IngestSettings::default();
            let example = ConfigFile {
                data_dir: Some(crate::storage::FontStore::default_dir()),
                max_file_size_mib: Some(defaults.max_file_size_mib()),
                batch_size: Some(defaults.batch_size),
                log_to_file: Some(false),
            };
            example.save_to(&settings_path)?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("You can now:");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View application logs in: {:?}", logs_dir);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        let config = ConfigFile {
            data_dir: Some(PathBuf::from("/tmp/fonts")),
            max_file_size_mib: Some(5),
            batch_size: None,
            log_to_file: Some(true),
        };
        config.save_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path), Some(config));
    }

    #[test]
    fn test_missing_or_broken_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(ConfigFile::load_from(&path), None);

        fs::write(&path, "not json").unwrap();
        assert_eq!(ConfigFile::load_from(&path), None);
    }

    #[test]
    fn test_overrides_apply_to_ingest_settings() {
        let config = ConfigFile {
            max_file_size_mib: Some(5),
            batch_size: Some(0),
            ..Default::default()
        };
        let settings = config.ingest_settings();
        assert_eq!(settings.max_file_size, 5 * 1024 * 1024);
        assert_eq!(settings.batch_size, 10, "zero batch size is ignored");
    }

    #[test]
    fn test_huge_size_limit_saturates() {
        let config = ConfigFile {
            max_file_size_mib: Some(u64::MAX),
            ..Default::default()
        };
        assert_eq!(config.ingest_settings().max_file_size, u64::MAX);
    }
}
