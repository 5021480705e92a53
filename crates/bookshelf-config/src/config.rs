use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest SDK level that still allows plain filesystem access (Android 10, "Q").
pub const LEGACY_STORAGE_MAX_SDK: u32 = 29;

const DEFAULT_BACKUP_PATH: &str = "/storage/emulated/0/BookShelf";
const CONFIG_DIR: &str = "~/.config/bookshelf-backup";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder used when the user picks "default folder" from the folder menu
    pub default_backup_path: PathBuf,
    /// Devices above this SDK level cannot use plain filesystem paths
    pub legacy_storage_max_sdk: u32,
    /// Where [`crate::Preferences`] are persisted
    pub preferences_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = shellexpand::tilde(CONFIG_DIR);
        Self {
            default_backup_path: PathBuf::from(DEFAULT_BACKUP_PATH),
            legacy_storage_max_sdk: LEGACY_STORAGE_MAX_SDK,
            preferences_path: PathBuf::from(config_dir.as_ref()).join("preferences.toml"),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded paths
        config.default_backup_path =
            Self::expand_path(&config.default_backup_path).unwrap_or(config.default_backup_path);
        config.preferences_path =
            Self::expand_path(&config.preferences_path).unwrap_or(config.preferences_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load the config file, falling back to defaults when there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load()? {
            Some(config) => Ok(config),
            None => {
                log::info!(
                    "No config at {}, using defaults",
                    Self::config_path().display()
                );
                Ok(Self::default())
            }
        }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde(CONFIG_DIR);
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Whether plain filesystem paths are usable on a device at `sdk_int`.
    pub fn allows_legacy_storage(&self, sdk_int: u32) -> bool {
        sdk_int <= self.legacy_storage_max_sdk
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
