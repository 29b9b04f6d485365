//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up scmap defaults.

use crate::config::Config;
use anyhow::Result;
use scmap::MapVariant;
use std::path::PathBuf;

/// Values the configure command can set
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub variant: Option<MapVariant>,
    pub data_dir: Option<PathBuf>,
    pub skins_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.variant.is_none()
            && self.data_dir.is_none()
            && self.skins_dir.is_none()
            && self.output_dir.is_none()
    }

    /// Overwrite the fields this update sets
    fn apply(self, config: &mut Config) {
        if let Some(variant) = self.variant {
            config.variant = Some(variant);
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = Some(dir);
        }
        if let Some(dir) = self.skins_dir {
            config.skins_dir = Some(dir);
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = Some(dir);
        }
    }
}

/// Handle the configure command
pub fn handle(update: ConfigUpdate, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if update.is_empty() {
        show_usage();
        return Ok(());
    }

    update.apply(&mut config);
    config.save()?;
    println!("Configuration updated");
    show_config(&config);
    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    let unset = || "(not set)".to_string();
    println!(
        "Variant:    {}",
        config.variant.map(|v| v.to_string()).unwrap_or_else(unset)
    );
    for (label, dir) in [
        ("Data dir:  ", &config.data_dir),
        ("Skins dir: ", &config.skins_dir),
        ("Output dir:", &config.output_dir),
    ] {
        println!(
            "{} {}",
            label,
            dir.as_ref().map(|d| d.display().to_string()).unwrap_or_else(unset)
        );
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: scmap configure --variant oz --data-dir ./map --skins-dir ./stock");
    println!("   or: scmap configure --show");
}
