use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::{DEFAULT_GRID_SIZE, DEFAULT_REFRESH_RATE_MS, MIN_GRID_SIZE};

/// Tunables fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Milliseconds between two simulation ticks
    pub refresh_rate_ms: u64,
    /// Number of cells along each side of the square grid
    pub grid_size: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

impl GameConfig {
    pub fn new(refresh_rate_ms: u64, grid_size: i32) -> Self {
        Self {
            refresh_rate_ms,
            grid_size,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms)
    }

    /// Rejects grids too small for the starting snake and a zero tick interval
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < MIN_GRID_SIZE {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.refresh_rate_ms == 0 {
            return Err(ConfigError::ZeroRefreshRate);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    GridTooSmall(i32),
    ZeroRefreshRate,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::GridTooSmall(size) => {
                write!(f, "grid size {} is below the minimum of {}", size, MIN_GRID_SIZE)
            }
            ConfigError::ZeroRefreshRate => write!(f, "refresh rate must be at least 1ms"),
        }
    }
}

impl std::error::Error for ConfigError {}
