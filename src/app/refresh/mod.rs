//! Dataset refresh
//!
//! [`Refresher`] fetches the upstream document, partitions it and stores every
//! section with a TTL running to the next daily rollover. Cache misses and the
//! [`RefreshScheduler`] both go through it, and concurrent callers share one
//! upstream fetch.

pub mod refresher;
pub mod scheduler;

pub use refresher::{RefreshSummary, Refresher};
pub use scheduler::RefreshScheduler;
