//! Cache statistics

use serde::{Deserialize, Serialize};

/// Snapshot of cache occupancy and lookup counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries held, including expired ones not yet purged
    pub total_entries: usize,
    /// Entries past their expiry
    pub expired_entries: usize,
    /// Lookups that found a live value
    pub hits: u64,
    /// Lookups that found nothing or an expired value
    pub misses: u64,
}

impl CacheStats {
    /// Entries that would currently be served
    pub fn live_entries(&self) -> usize {
        self.total_entries.saturating_sub(self.expired_entries)
    }

    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            (self.hits as f64 / lookups as f64) * 100.0
        }
    }
}
