//! Configuration System
//!
//! Loads simulation parameters from a TOML file. Every section and field is
//! optional and falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::random::MAX_RAND_INT;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "stabsim.toml";

/// Complete simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub centroid: CentroidConfig,
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for every random draw of a run
    pub seed: u64,
    /// Moves allowed before a run is reported as not stabilising
    pub max_moves: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_moves: 10_000,
        }
    }
}

/// Bounds for the generic random generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Inclusive upper bound of random integers
    pub int_upper_bound: i64,
    /// Random floats are drawn from `[0, float_scale)`
    pub float_scale: f64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            int_upper_bound: MAX_RAND_INT,
            float_scale: 1.0,
        }
    }
}

/// Centroid program parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentroidConfig {
    /// Initial pointers are random ids in `0..=pointer_upper_bound`
    pub pointer_upper_bound: u64,
    /// Scale of random own weights
    pub weight_scale: f64,
    /// Scale of random initial `W` entries
    pub table_scale: f64,
    /// Largest integer weight used by random weighted trees
    pub max_weight: u32,
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            pointer_upper_bound: 10,
            weight_scale: 10.0,
            table_scale: 10.0,
            max_weight: 10,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
