/// Engine configuration — track bounds, stat ceilings, and energy economy.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables that differ between game variants. Every field has a default,
/// so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Last reachable step; moving from here is rejected.
    pub max_position: u32,
    /// Rendered width of the track. May exceed `max_position`.
    pub track_length: u32,
    pub health_max: u32,
    pub energy_max: u32,
    pub energy_cost_per_step: u32,
    /// Energy restored per whole hour since the last update.
    pub energy_regen_per_hour: u32,
    pub starting: StartingStats,
}

/// Stats a freshly created player begins with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingStats {
    pub health: u32,
    pub energy: u32,
    pub gold: u64,
    pub cristal: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_position: 50,
            track_length: 70,
            health_max: 100,
            energy_max: 200,
            energy_cost_per_step: 10,
            energy_regen_per_hour: 10,
            starting: StartingStats::default(),
        }
    }
}

impl Default for StartingStats {
    fn default() -> Self {
        Self {
            health: 100,
            energy: 100,
            gold: 100,
            cristal: 0,
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs whose starting stats break the stat ceilings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting.health > self.health_max {
            return Err(ConfigError::Invalid(format!(
                "starting health {} exceeds health_max {}",
                self.starting.health, self.health_max
            )));
        }
        if self.starting.energy > self.energy_max {
            return Err(ConfigError::Invalid(format!(
                "starting energy {} exceeds energy_max {}",
                self.starting.energy, self.energy_max
            )));
        }
        Ok(())
    }
}
