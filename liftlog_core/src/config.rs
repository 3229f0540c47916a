//! Configuration file support for liftlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftlog/config.toml`.

use crate::file_store::{FileStorage, Layout};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where records live
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// How records are laid out on disk
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub layout: Layout,
}

/// Home-relative fallback when the platform directory is unknown
fn home_dir_or_cwd() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir_or_cwd().join(".local/share"));
    base.join("liftlog")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir_or_cwd().join(".config"));
        base.join("liftlog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// File storage for the configured directory and layout
    pub fn open_storage(&self) -> FileStorage {
        FileStorage::new(&self.data.data_dir, self.storage.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.layout, Layout::PerCollection);
        assert!(config.data.data_dir.ends_with("liftlog"));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().join("data");
        config.storage.layout = Layout::SingleFile;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
        assert_eq!(loaded.storage.layout, Layout::SingleFile);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[storage]
layout = "single_file"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.layout, Layout::SingleFile);
        assert!(config.data.data_dir.ends_with("liftlog")); // default
    }

    #[test]
    fn test_unknown_layout_rejected() {
        let toml_str = r#"
[storage]
layout = "sqlite"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_open_storage_uses_configured_paths() {
        let mut config = Config::default();
        config.data.data_dir = PathBuf::from("/tmp/liftlog-test");
        config.storage.layout = Layout::SingleFile;

        let storage = config.open_storage();
        assert_eq!(storage.root(), Path::new("/tmp/liftlog-test"));
        assert_eq!(storage.layout(), Layout::SingleFile);
    }
}
