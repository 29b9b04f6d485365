//! Configuration management for scmap CLI

use anyhow::{Context, Result};
use scmap::MapVariant;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Stock tables live next to the map files unless configured otherwise
const DEFAULT_SKINS_SUBDIR: &str = "skins";
const DEFAULT_OUTPUT_DIR: &str = "data";

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub variant: Option<MapVariant>,
    pub data_dir: Option<PathBuf>,
    pub skins_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("scmap");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Flag, else configured variant, else `og`
    pub fn variant(&self, flag: Option<MapVariant>) -> MapVariant {
        flag.or(self.variant).unwrap_or_default()
    }

    /// Flag, else configured directory, else the working directory
    pub fn data_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Flag, else configured directory, else `skins/` under the data directory
    pub fn skins_dir(&self, flag: Option<&Path>, data_dir: &Path) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.skins_dir.clone())
            .unwrap_or_else(|| data_dir.join(DEFAULT_SKINS_SUBDIR))
    }

    pub fn output_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}
