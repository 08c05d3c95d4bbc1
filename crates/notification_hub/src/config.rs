use std::path::Path;

use anyhow::{bail, Context, Result};
use hub_core::{Rule, DEFAULT_LABEL_BODY_LENGTH};
use serde::{Deserialize, Serialize};

use crate::expiry::MAX_EXPIRY;

/// Contents of `config.json`. Read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// Returned verbatim by `GetCapabilities`.
    pub capabilities: Vec<String>,
    /// Expiry applied to notifications that ask for the server default. `None` keeps them open
    /// until they are closed.
    pub default_timeout_ms: Option<u64>,
    /// How many characters of the body end up in a thread label.
    pub label_body_length: usize,
    /// Notifications matching any of these rules are accepted but never shown.
    pub ignore: Vec<Rule>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            capabilities: vec!["actions".to_owned(), "body".to_owned()],
            default_timeout_ms: None,
            label_body_length: DEFAULT_LABEL_BODY_LENGTH,
            ignore: Vec::new(),
        }
    }
}

impl HubConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        let config: HubConfig = serde_json::from_str(content).context("Failed to parse configuration")?;
        if let Some(ms) = config.default_timeout_ms {
            if u128::from(ms) > MAX_EXPIRY.as_millis() {
                bail!("default_timeout_ms of {} is longer than the maximum of {}ms", ms, MAX_EXPIRY.as_millis());
            }
        }
        Ok(config)
    }
}

/// Read the configuration. A missing file is not an error; the defaults are used instead.
pub fn read_from_file(path: &Path) -> Result<HubConfig> {
    if !path.exists() {
        log::info!("No configuration at {}, using defaults", path.display());
        return Ok(HubConfig::default());
    }
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    HubConfig::from_json(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
}
