//! Loosely-typed upstream records with typed accessors
//!
//! Upstream records carry many fields the proxy passes through untouched, so
//! a record is kept as its JSON object. The handful of fields the proxy reads
//! by name are exposed through typed accessors that accept either JSON numbers
//! or numeric strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical record identifier
///
/// Every id comparison in the proxy goes through this type: ids are parsed as
/// integers whether they arrive as JSON numbers, integral floats or numeric
/// strings. Anything else is not an id and never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Create an id from its integer value
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the integer value
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Interpret a JSON value as an id
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i))
                } else {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.is_finite())
                        .map(|f| Self(f as i64))
                }
            }
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A single upstream record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap a JSON object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Convert a JSON value into a record if it is an object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// The record's own `id`
    pub fn id(&self) -> Option<RecordId> {
        self.reference("id")
    }

    /// An id-valued field such as `gorivo_id`
    pub fn reference(&self, field: &str) -> Option<RecordId> {
        self.0.get(field).and_then(RecordId::from_value)
    }

    /// A numeric field such as `lat` or `cijena`
    pub fn number(&self, field: &str) -> Option<f64> {
        let value = match self.0.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|f| f.is_finite())
    }

    /// A string field such as `naziv`
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Nested records held in an array field such as `cjenici`
    ///
    /// Array elements that are not objects are skipped.
    pub fn children(&self, field: &str) -> Vec<Record> {
        match self.0.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| Record::from_value(item.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Raw field access
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Set a field when a value is present, otherwise remove it
    pub fn attach(&mut self, field: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.0.insert(field.to_string(), value);
            }
            None => {
                self.0.remove(field);
            }
        }
    }

    /// Remove a field
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Borrow the underlying JSON object
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert back into a JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

/// Find the first record with the given id
pub fn find_by_id<'a>(records: &'a [Record], id: RecordId) -> Option<&'a Record> {
    records.iter().find(|record| record.id() == Some(id))
}
