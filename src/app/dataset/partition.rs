//! Splitting a fetched dataset into cache entries

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::sections;

use super::{Dataset, Section};

/// A value held by the cache
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// The whole upstream document
    Dataset(Arc<Dataset>),
    /// One section's records
    Section(Arc<Section>),
}

impl CachedValue {
    /// The section records, if this value is a section
    pub fn as_section(&self) -> Option<&Arc<Section>> {
        match self {
            Self::Section(section) => Some(section),
            Self::Dataset(_) => None,
        }
    }

    /// The document, if this value is the whole dataset
    pub fn as_dataset(&self) -> Option<&Arc<Dataset>> {
        match self {
            Self::Dataset(dataset) => Some(dataset),
            Self::Section(_) => None,
        }
    }

    /// Serialize for a response body
    pub fn to_json(&self) -> Value {
        match self {
            Self::Dataset(dataset) => dataset.as_ref().clone().into_value(),
            Self::Section(section) => Value::Array(
                section
                    .iter()
                    .map(|record| Value::Object(record.fields().clone()))
                    .collect(),
            ),
        }
    }
}

/// Split a dataset into the entries written by one refresh
///
/// Always yields the `allData` entry. Each partitioned section present as an
/// array yields its own entry; absent or malformed sections are left out so
/// that lookups for them report not found. Non-object elements are dropped
/// from the document itself, so every section entry equals the matching
/// section of the `allData` entry.
pub fn partition(mut dataset: Dataset) -> Vec<(String, CachedValue)> {
    dataset.retain_records(&sections::PARTITIONED);
    let dataset = Arc::new(dataset);

    let mut entries = Vec::with_capacity(sections::PARTITIONED.len() + 1);

    for name in sections::PARTITIONED {
        match dataset.section(name) {
            Some(records) => {
                debug!("Partitioned section {} with {} records", name, records.len());
                entries.push((name.to_string(), CachedValue::Section(Arc::new(records))));
            }
            None => warn!("Upstream dataset has no usable section {}", name),
        }
    }

    entries.push((sections::ALL_DATA.to_string(), CachedValue::Dataset(dataset)));
    entries
}
