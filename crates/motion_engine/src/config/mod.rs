//! Engine configuration
//!
//! Groups every subsystem's tuning into one document that hosts can ship
//! as a TOML file. Missing sections fall back to their defaults, so a
//! config file only needs to spell out what it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::movement::MovementConfig;
use crate::physics::CollisionConfig;
use crate::scheduler::SchedulerConfig;
use crate::spatial::BvhConfig;

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed-timestep loop tuning
    pub scheduler: SchedulerConfig,

    /// Player movement tuning
    pub movement: MovementConfig,

    /// Collision query tuning
    pub collision: CollisionConfig,

    /// Spatial index build tuning
    pub spatial: BvhConfig,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl SimConfig {
    /// Parse a configuration document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize the configuration as a TOML document
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
