//! Fuel Price Proxy Library
//!
//! An in-memory caching proxy for the Croatian fuel price dataset. The whole
//! document is fetched once a day, partitioned by section into a TTL cache and
//! served over a small read-only HTTP API with request-time joins, a
//! geographic filter and cheapest-price ranking.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod server;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
