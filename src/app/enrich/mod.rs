//! Request-time enrichment of cached records
//!
//! - [`join`] - station joins, geographic filtering and cheapest-price ranking
//! - [`geo`] - distance calculation
//! - [`patch`] - corrections for the full-document response

pub mod geo;
pub mod join;
pub mod patch;

pub use geo::calculate_distance;
pub use join::{enrich_station, filter_stations, GeoQuery, ReferenceData};
pub use patch::{patch_fuel_categories, public_dataset};
