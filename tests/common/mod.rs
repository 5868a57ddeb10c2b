//! Shared fixtures for integration tests
//!
//! A scripted dataset source and a small but complete dataset: three stations
//! around Zagreb and Split, petrol and diesel fuels, two operators and two
//! station options.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use fuel_price_proxy::app::{CacheConfig, Dataset, DatasetCache, DatasetSource, Refresher};
use fuel_price_proxy::errors::{FetchError, FetchResult};

/// Dataset source that counts fetches and can be switched to failing
#[derive(Debug)]
pub struct ScriptedSource {
    document: Value,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Duration,
}

impl ScriptedSource {
    pub fn new(document: Value) -> Arc<Self> {
        Self::with_delay(document, Duration::ZERO)
    }

    pub fn with_delay(document: Value, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            document,
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay,
        })
    }

    pub fn failing(document: Value) -> Arc<Self> {
        let source = Self::new(document);
        source.set_failing(true);
        source
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DatasetSource for ScriptedSource {
    async fn fetch_dataset(&self) -> FetchResult<Dataset> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Timeout { seconds: 30 });
        }
        Dataset::from_value(self.document.clone())
    }
}

/// Refresher over an empty cache
pub fn refresher(source: Arc<ScriptedSource>) -> Arc<Refresher> {
    Arc::new(Refresher::new(
        source,
        Arc::new(DatasetCache::new()),
        CacheConfig::default(),
    ))
}

/// Zagreb city centre
pub const ZAGREB: (f64, f64) = (45.8150, 15.9819);

/// Petrol is fuel-type kind 1, diesel kind 2
pub fn document() -> Value {
    json!({
        "postajas": [
            {
                "id": 1,
                "naziv": "Zagreb Centar",
                "lat": 45.8150,
                "long": 15.9819,
                "obveznik_id": 100,
                "cjenici": [
                    {"id": 11, "gorivo_id": 29, "cijena": 1.52},
                    {"id": 12, "gorivo_id": 30, "cijena": 1.61},
                    {"id": 13, "gorivo_id": 31, "cijena": 1.49}
                ],
                "opcije": [{"id": 1, "opcija_id": 5}]
            },
            {
                "id": 2,
                "naziv": "Zagreb Istok",
                "lat": 45.8100,
                "long": 16.0300,
                "obveznik_id": 200,
                "cjenici": [
                    {"id": 21, "gorivo_id": 29, "cijena": 1.45}
                ],
                "opcije": []
            },
            {
                "id": 3,
                "naziv": "Split Luka",
                "lat": 43.5081,
                "long": 16.4402,
                "obveznik_id": 100,
                "cjenici": [
                    {"id": 31, "gorivo_id": 29, "cijena": 1.40}
                ],
                "opcije": [{"id": 2, "opcija_id": 6}]
            }
        ],
        "gorivos": [
            {"id": 29, "naziv": "EURODIESEL BS", "vrsta_goriva_id": 3},
            {"id": 30, "naziv": "EUROSUPER 95", "vrsta_goriva_id": 3},
            {"id": 31, "naziv": "EUROSUPER 100", "vrsta_goriva_id": 4}
        ],
        "obvezniks": [
            {"id": 100, "naziv": "Prva Naftna"},
            {"id": 200, "naziv": "Druga Naftna"}
        ],
        "opcijas": [
            {"id": 5, "naziv": "Autopraonica"},
            {"id": 6, "naziv": "Restoran"}
        ],
        "vrsta_danas": [{"id": 1, "naziv": "Radni dan"}],
        "vrsta_gorivas": [
            {"id": 3, "naziv": "Dizel", "tip_goriva_id": 2},
            {"id": 4, "naziv": "Benzin", "tip_goriva_id": 1}
        ],
        "tip_gorivas": [
            {"id": 1, "naziv": "Benzinska goriva"},
            {"id": 2, "naziv": "Dizelska goriva"}
        ],
        "naseljes": [{"id": 1, "naziv": "Zagreb"}],
        "opcina_grads": [{"id": 1}],
        "zupanijas": [{"id": 1}]
    })
}
