//! In-memory dataset cache with daily expiry
//!
//! This module provides the shared store every handler reads from. Entries
//! written by one refresh expire together shortly after local midnight; a
//! stale entry reads as a miss and is replaced by the next refresh.
//!
//! # Module Organization
//!
//! - [`config`] - Rollover time and purge settings
//! - [`store`] - The generic [`TtlStore`]
//! - [`stats`] - Occupancy and hit/miss counters
//! - [`ttl`] - Expiry calculation for refreshed entries

pub mod config;
pub mod stats;
pub mod store;
pub mod ttl;

use crate::app::dataset::CachedValue;

// Re-export main public API
pub use config::CacheConfig;
pub use stats::CacheStats;
pub use store::TtlStore;
pub use ttl::{ttl_from_local_clock, ttl_until_rollover};

/// The cache shared by the refresher and the HTTP handlers
pub type DatasetCache = TtlStore<CachedValue>;
