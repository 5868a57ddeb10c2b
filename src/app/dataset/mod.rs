//! Upstream dataset model and partitioning
//!
//! The upstream document is a JSON object mapping section names to record
//! arrays. It is parsed once per refresh, shared immutably behind `Arc`, and
//! split into per-section cache entries by [`partition`].
//!
//! - [`record`] - loosely-typed records and the canonical [`RecordId`]
//! - [`partition`] - splitting a dataset into cache entries

pub mod partition;
pub mod record;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{FetchError, FetchResult};

pub use partition::{partition, CachedValue};
pub use record::{find_by_id, Record, RecordId};

/// Ordered records of one dataset section
pub type Section = Vec<Record>;

/// The full upstream document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(Map<String, Value>);

impl Dataset {
    /// Wrap a parsed JSON object
    pub fn new(sections: Map<String, Value>) -> Self {
        Self(sections)
    }

    /// Build a dataset from a parsed document
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Parse` if the document is not a JSON object
    pub fn from_value(value: Value) -> FetchResult<Self> {
        match value {
            Value::Object(sections) => Ok(Self(sections)),
            other => Err(FetchError::Parse {
                message: format!("expected a JSON object at top level, found {}", kind(&other)),
            }),
        }
    }

    /// Raw section value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Mutable raw section value
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0.get_mut(name)
    }

    /// Remove a section
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Section names present in the document
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Decode a section into records, skipping elements that are not objects
    ///
    /// Returns `None` if the section is absent or not an array.
    pub fn section(&self, name: &str) -> Option<Section> {
        let Value::Array(items) = self.0.get(name)? else {
            return None;
        };
        Some(
            items
                .iter()
                .filter_map(|item| Record::from_value(item.clone()))
                .collect(),
        )
    }

    /// Drop elements that are not objects from the named array sections
    ///
    /// Returns how many elements were dropped.
    pub fn retain_records(&mut self, names: &[&str]) -> usize {
        let mut dropped = 0;
        for name in names {
            if let Some(Value::Array(items)) = self.0.get_mut(*name) {
                let before = items.len();
                items.retain(Value::is_object);
                if items.len() != before {
                    tracing::warn!(
                        "Dropped {} non-object entries from section {}",
                        before - items.len(),
                        name
                    );
                    dropped += before - items.len();
                }
            }
        }
        dropped
    }

    /// Number of entries per array section
    pub fn section_sizes(&self) -> Vec<(String, usize)> {
        self.0
            .iter()
            .filter_map(|(name, value)| value.as_array().map(|items| (name.clone(), items.len())))
            .collect()
    }

    /// Convert back into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
