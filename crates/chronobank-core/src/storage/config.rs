//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Timer duration presets
//! - Energy policy overrides (costs, rewards, limits)
//! - Starting/maximum energy for the ledger
//!
//! Configuration is stored at `~/.config/chronobank/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::energy::EnergyPolicy;
use crate::error::ConfigError;
use crate::timer::DurationPresets;

/// Ledger bootstrap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyBankConfig {
    #[serde(default = "default_initial_energy")]
    pub initial_energy: i64,
    #[serde(default = "default_max_energy")]
    pub max_energy: i64,
}

fn default_initial_energy() -> i64 {
    100
}
fn default_max_energy() -> i64 {
    100
}

impl Default for EnergyBankConfig {
    fn default() -> Self {
        Self {
            initial_energy: default_initial_energy(),
            max_energy: default_max_energy(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/chronobank/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub durations: DurationPresets,
    #[serde(default)]
    pub policy: EnergyPolicy,
    #[serde(default)]
    pub bank: EnergyBankConfig,
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/chronobank"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file
    /// doesn't exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, text).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}
