use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::Path,
    time::Duration,
};

use crate::error::TallyError;

/// Engine configuration, loadable from a TOML file.
///
/// Every field has a default so an absent or partial file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Debounce window for mutation-driven recomputes, in milliseconds.
    pub debounce_ms: u64,
    /// Name of the registered [`DocSchema`](crate::schema::DocSchema) to
    /// traverse by.
    pub schema: String,
    /// Title rendered at the top of the summary panel.
    pub panel_title: String,
}

impl Default for TallyConfig {
    fn default() -> Self {
        TallyConfig {
            debounce_ms: 500,
            schema: "sessionlab".to_string(),
            panel_title: "Time division".to_string(),
        }
    }
}

impl TallyConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TallyError> {
        tracing::debug!("Attempting to read config from: {:?}", path.as_ref());
        if !path.as_ref().exists() {
            tracing::debug!("Config file not found, using defaults.");
            return Ok(TallyConfig::default());
        }
        let content = read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TallyError> {
        tracing::debug!("Attempting to write config to: {:?}", path.as_ref());
        let toml_string = toml::to_string(self)?;
        write(path, toml_string)?;
        Ok(())
    }
}
