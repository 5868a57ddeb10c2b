//! Cache configuration types and defaults

use serde::{Deserialize, Serialize};

use crate::constants::refresh;

/// Configuration for the in-memory cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Local hour at which every entry written by a refresh expires
    pub rollover_hour: u32,
    /// Local minute at which every entry written by a refresh expires
    pub rollover_minute: u32,
    /// Drop expired entries after each successful refresh
    pub purge_after_refresh: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            rollover_hour: refresh::ROLLOVER_HOUR,
            rollover_minute: refresh::ROLLOVER_MINUTE,
            purge_after_refresh: true,
        }
    }
}

impl CacheConfig {
    /// Set the local rollover time
    pub fn with_rollover(mut self, hour: u32, minute: u32) -> Self {
        self.rollover_hour = hour;
        self.rollover_minute = minute;
        self
    }

    /// Enable or disable purging after refresh
    pub fn with_purge_after_refresh(mut self, enabled: bool) -> Self {
        self.purge_after_refresh = enabled;
        self
    }

    /// Check that the rollover time is a valid time of day
    pub fn is_valid(&self) -> bool {
        self.rollover_hour < 24 && self.rollover_minute < 60
    }
}
