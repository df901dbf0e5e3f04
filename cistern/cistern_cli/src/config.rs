//! Configuration file handling for the CLI.

use anyhow::{Context, Result};
use cistern_pool::PoolConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for the demonstration workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// Upper bound of the random delay before a worker starts, in milliseconds
    pub max_delay_ms: u64,

    /// Upper bound of the simulated query duration, in milliseconds
    pub query_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            workers: 50,
            max_delay_ms: 1_000,
            query_ms: 100,
        }
    }
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Pool settings
    pub pool: PoolConfig,

    /// Workload settings
    pub demo: DemoConfig,
}

impl CliConfig {
    /// Load the configuration from a TOML file, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}
