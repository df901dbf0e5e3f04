//! Configuration for resource pools

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PoolError, Result};

/// Admission policy of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolMode {
    /// Soft cap: acquire never waits and may overshoot the target size
    #[default]
    Soft,

    /// Hard cap: acquire waits for a release once the size is reached
    Bounded,
}

/// Configuration for a resource pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Admission policy
    pub mode: PoolMode,

    /// Number of idle resources kept for reuse (soft mode), or the maximum
    /// number of resources in existence (bounded mode)
    pub target_size: usize,

    /// How long a bounded acquire waits for a release, in milliseconds
    pub acquire_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            mode: PoolMode::Soft,
            target_size: 2,
            acquire_timeout_ms: 3_000,
        }
    }
}

impl PoolConfig {
    /// Create a soft-mode configuration with the given target size
    pub fn soft(target_size: usize) -> Self {
        Self {
            mode: PoolMode::Soft,
            target_size,
            ..Default::default()
        }
    }

    /// Create a bounded-mode configuration
    pub fn bounded(max_size: usize, acquire_timeout: Duration) -> Self {
        Self {
            mode: PoolMode::Bounded,
            target_size: max_size,
            acquire_timeout_ms: u64::try_from(acquire_timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Acquire timeout as a [`Duration`]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Check the configuration, failing on a zero size
    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(PoolError::InvalidSize(self.target_size));
        }
        Ok(())
    }
}
