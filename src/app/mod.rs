//! Core application logic for the fuel price proxy
//!
//! This module contains the upstream client, the dataset model, the TTL cache,
//! the refresh machinery and the request-time enrichment used by the HTTP
//! handlers.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fuel_price_proxy::app::{CacheConfig, DatasetCache, Refresher, UpstreamClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UpstreamClient::new()?;
//! let cache = Arc::new(DatasetCache::new());
//! let refresher = Refresher::new(Arc::new(client), cache, CacheConfig::default());
//!
//! let summary = refresher.run_once().await?;
//! for (section, count) in &summary.section_sizes {
//!     println!("{}: {}", section, count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod dataset;
pub mod enrich;
pub mod refresh;
pub mod signals;

// Re-export main public API
pub use cache::{CacheConfig, CacheStats, DatasetCache, TtlStore};
pub use client::{ClientConfig, DatasetSource, UpstreamClient};
pub use dataset::{CachedValue, Dataset, Record, RecordId, Section};
pub use enrich::{GeoQuery, ReferenceData};
pub use refresh::{RefreshScheduler, RefreshSummary, Refresher};
pub use signals::{create_shutdown_channel, wait_for_shutdown_signal, SignalHandler};
