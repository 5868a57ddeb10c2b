//! Fetch, partition and store cycles with single-flight coordination
//!
//! Scheduled refreshes and cache misses both end up in [`Refresher`]. At most
//! one cycle runs at a time: a caller that finds a cycle in flight, or one
//! that finished after the caller looked at the cache, takes that cycle's
//! outcome instead of fetching again.
//!
//! Each cycle runs in its own task. A caller that goes away (client
//! disconnect) stops waiting but never cancels the cycle.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use crate::app::cache::{ttl_from_local_clock, CacheConfig, CacheStats, DatasetCache};
use crate::app::client::DatasetSource;
use crate::app::dataset::{partition, CachedValue, Dataset, Section};
use crate::app::enrich::ReferenceData;
use crate::constants::sections;
use crate::errors::{FetchError, FetchResult, LookupError, LookupResult};

/// What one successful cycle wrote
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSummary {
    /// Cache keys written
    pub keys: Vec<String>,
    /// Entry count of every array section in the fetched document
    pub section_sizes: Vec<(String, usize)>,
    /// Lifetime given to the written entries
    pub ttl: Duration,
    /// Wall time of the cycle
    pub elapsed: Duration,
    /// Cache occupancy and lookup counters after the write
    pub cache: CacheStats,
}

type CycleFuture = Shared<BoxFuture<'static, FetchResult<RefreshSummary>>>;

/// Most recently started cycle
struct Cycle {
    generation: u64,
    outcome: CycleFuture,
}

/// Coordinates refresh cycles against a shared cache
pub struct Refresher {
    source: Arc<dyn DatasetSource>,
    cache: Arc<DatasetCache>,
    config: CacheConfig,
    latest: Mutex<Option<Cycle>>,
    /// Generation of the last cycle that finished, successfully or not
    completed: Arc<AtomicU64>,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("source", &self.source)
            .field("config", &self.config)
            .field("completed_cycles", &self.completed_cycles())
            .finish()
    }
}

impl Refresher {
    /// Create a refresher writing into `cache`
    pub fn new(source: Arc<dyn DatasetSource>, cache: Arc<DatasetCache>, config: CacheConfig) -> Self {
        Self {
            source,
            cache,
            config,
            latest: Mutex::new(None),
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The cache this refresher writes into
    pub fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    /// Number of cycles finished so far
    pub fn completed_cycles(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Run one full refresh, or join the one already in flight
    ///
    /// A failed refresh leaves every existing entry in place.
    ///
    /// # Errors
    ///
    /// Returns the `FetchError` of the cycle if it failed
    pub async fn run_once(&self) -> FetchResult<RefreshSummary> {
        let observed = self.completed_cycles();
        self.refresh_since(observed).await
    }

    /// Cached value for `key`, refreshing the whole dataset on a miss
    ///
    /// Keys outside the known section set are accepted; they miss, trigger a
    /// refresh like any other key and end up as not found.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Refresh` if the triggered refresh failed and
    /// `LookupError::NotFound` if the key is still empty afterwards
    pub async fn get_or_refresh(&self, key: &str) -> LookupResult<CachedValue> {
        let observed = self.completed_cycles();
        if let Some(value) = self.cache.get(key).await {
            return Ok(value);
        }

        debug!("Cache miss for {}, refreshing dataset", key);
        self.refresh_since(observed).await?;

        self.cache.get(key).await.ok_or_else(|| LookupError::NotFound {
            key: key.to_string(),
        })
    }

    /// Records of one section, refreshing on a miss
    ///
    /// # Errors
    ///
    /// As [`Refresher::get_or_refresh`]; a key holding the whole document is
    /// not a section and reports not found
    pub async fn section(&self, key: &str) -> LookupResult<Arc<Section>> {
        self.get_or_refresh(key)
            .await?
            .as_section()
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                key: key.to_string(),
            })
    }

    /// The whole document, refreshing on a miss
    ///
    /// # Errors
    ///
    /// As [`Refresher::get_or_refresh`]
    pub async fn dataset(&self) -> LookupResult<Arc<Dataset>> {
        self.get_or_refresh(sections::ALL_DATA)
            .await?
            .as_dataset()
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                key: sections::ALL_DATA.to_string(),
            })
    }

    /// Stations and the reference sections they join against, refreshing on a miss
    ///
    /// All five sections come from one cache snapshot, so every join resolves
    /// against the refresh that produced the stations. Absent reference
    /// sections come back empty and their lookups miss.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::Refresh` if the triggered refresh failed and
    /// `LookupError::NotFound` if there are still no stations afterwards
    pub async fn stations_with_references(&self) -> LookupResult<(Arc<Section>, ReferenceData)> {
        let observed = self.completed_cycles();
        if let Some(snapshot) = self.station_snapshot().await {
            return Ok(snapshot);
        }

        debug!("Cache miss for {}, refreshing dataset", sections::STATIONS);
        self.refresh_since(observed).await?;

        self.station_snapshot()
            .await
            .ok_or_else(|| LookupError::NotFound {
                key: sections::STATIONS.to_string(),
            })
    }

    async fn station_snapshot(&self) -> Option<(Arc<Section>, ReferenceData)> {
        let keys = [
            sections::STATIONS,
            sections::FUELS,
            sections::FUEL_CATEGORIES,
            sections::OPERATORS,
            sections::OPTIONS,
        ];
        let mut values = self
            .cache
            .get_many(&keys)
            .await
            .into_iter()
            .map(|value| value.and_then(|v| v.as_section().cloned()));

        let stations = values.next().flatten()?;
        let mut next = || values.next().flatten().unwrap_or_default();
        let fuels = next();
        let fuel_categories = next();
        let operators = next();
        let options = next();
        Some((
            stations,
            ReferenceData::new(fuels, fuel_categories, operators, options),
        ))
    }

    /// Outcome of the first cycle not finished by the time `observed` was read
    ///
    /// That is the cycle in flight, or one that finished since; otherwise a
    /// new cycle is started.
    async fn refresh_since(&self, observed: u64) -> FetchResult<RefreshSummary> {
        let outcome = {
            let mut latest = self.lock_latest();
            match latest.as_ref() {
                Some(cycle) if cycle.generation > observed => {
                    debug!("Joining refresh cycle {}", cycle.generation);
                    cycle.outcome.clone()
                }
                _ => {
                    let generation = latest.as_ref().map(|c| c.generation).unwrap_or(0) + 1;
                    let outcome = self.start_cycle(generation);
                    *latest = Some(Cycle {
                        generation,
                        outcome: outcome.clone(),
                    });
                    outcome
                }
            }
        };

        outcome.await
    }

    fn start_cycle(&self, generation: u64) -> CycleFuture {
        debug!("Starting refresh cycle {}", generation);
        let cycle = refresh_cycle(
            Arc::clone(&self.source),
            Arc::clone(&self.cache),
            self.config.clone(),
        );
        let completed = Arc::clone(&self.completed);

        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(cycle)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(FetchError::Aborted {
                        message: "refresh task panicked".to_string(),
                    })
                });
            completed.store(generation, Ordering::SeqCst);
            outcome
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(FetchError::Aborted {
                    message: e.to_string(),
                })
            })
        }
        .boxed()
        .shared()
    }

    fn lock_latest(&self) -> std::sync::MutexGuard<'_, Option<Cycle>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fetch, partition and store one copy of the dataset
async fn refresh_cycle(
    source: Arc<dyn DatasetSource>,
    cache: Arc<DatasetCache>,
    config: CacheConfig,
) -> FetchResult<RefreshSummary> {
    let started = Instant::now();

    let dataset = match source.fetch_dataset().await {
        Ok(dataset) => dataset,
        Err(e) => {
            warn!("Refresh failed, keeping cached entries: {}", e);
            return Err(e);
        }
    };

    let entries = partition(dataset);
    let section_sizes = entries
        .iter()
        .find_map(|(_, value)| value.as_dataset())
        .map(|dataset| dataset.section_sizes())
        .unwrap_or_default();
    let keys: Vec<String> = entries.iter().map(|(key, _)| key.clone()).collect();
    let ttl = ttl_from_local_clock(&config);

    cache.set_many(entries, ttl).await;

    if config.purge_after_refresh {
        let purged = cache.purge_expired().await;
        if purged > 0 {
            debug!("Purged {} expired cache entries", purged);
        }
    }

    let summary = RefreshSummary {
        keys,
        section_sizes,
        ttl,
        elapsed: started.elapsed(),
        cache: cache.stats().await,
    };
    info!(
        "Refreshed {} cache keys in {:.2}s, valid for {}s",
        summary.keys.len(),
        summary.elapsed.as_secs_f64(),
        summary.ttl.as_secs()
    );
    info!(
        "Cache holds {} live entries ({} expired), hit rate {:.1}% over {} lookups",
        summary.cache.live_entries(),
        summary.cache.expired_entries,
        summary.cache.hit_rate(),
        summary.cache.hits + summary.cache.misses
    );
    Ok(summary)
}
