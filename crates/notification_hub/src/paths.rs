use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Stores references to all the paths relevant to notification-hub.
#[derive(Debug, Clone)]
pub struct HubPaths {
    pub config_dir: PathBuf,
}

impl HubPaths {
    /// Use an explicitly given configuration directory, which has to exist.
    pub fn from_config_dir<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        if config_dir.is_file() {
            bail!("Please provide the path to the config directory, not a file within it")
        }

        if !config_dir.exists() {
            bail!("Configuration directory {} does not exist", config_dir.display());
        }

        Ok(HubPaths { config_dir: config_dir.canonicalize()? })
    }

    /// `$XDG_CONFIG_HOME/notification-hub`. The directory doesn't need to exist; the defaults are
    /// used in that case.
    pub fn default() -> Result<Self> {
        let config_home = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => PathBuf::from(std::env::var("HOME").context("Neither XDG_CONFIG_HOME nor HOME is set")?).join(".config"),
        };
        Ok(HubPaths { config_dir: config_home.join("notification-hub") })
    }

    pub fn get_config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

impl std::fmt::Display for HubPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "config-dir: {}", self.config_dir.display())
    }
}
