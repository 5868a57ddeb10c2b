//! Joining stations against reference sections
//!
//! All joins are "first record with a matching id, or nothing". An unresolved
//! reference removes the attachment field instead of failing, so enrichment
//! never errors and enriching twice yields the same record.
//!
//! Every function takes the station by reference and returns an owned copy;
//! cached records are never modified.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use crate::app::dataset::{find_by_id, Record, RecordId, Section};

use super::geo::calculate_distance;

/// Field names read from and attached to upstream records
mod fields {
    pub const PRICES: &str = "cjenici";
    pub const OPTIONS: &str = "opcije";
    pub const OPERATOR_ID: &str = "obveznik_id";
    pub const OPERATOR: &str = "obveznik";
    pub const FUEL_ID: &str = "gorivo_id";
    pub const FUEL: &str = "gorivo";
    pub const CATEGORY_ID: &str = "vrsta_goriva_id";
    pub const CATEGORY: &str = "vrsta_goriva";
    pub const KIND_ID: &str = "tip_goriva_id";
    pub const OPTION_ID: &str = "opcija_id";
    pub const OPTION: &str = "opcija";
    pub const PRICE: &str = "cijena";
    pub const LAT: &str = "lat";
    pub const LON: &str = "long";
    pub const CHEAPEST: &str = "jeftino";
    pub const DISTANCE: &str = "udaljenost";
}

/// Reference sections used to resolve station cross-references
///
/// Built from one cache snapshot so every section comes from the same
/// refresh. A missing section is empty and all of its lookups miss.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    fuels: Arc<Section>,
    fuel_categories: Arc<Section>,
    operators: Arc<Section>,
    options: Arc<Section>,
}

/// Query for [`filter_stations`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoQuery {
    /// Latitude of the query point in degrees
    pub lat: f64,
    /// Longitude of the query point in degrees
    pub lon: f64,
    /// Fuel-type kind (`tip_goriva`) the prices must belong to
    pub fuel_kind: RecordId,
    /// Stations further than this are dropped (km)
    pub max_distance_km: f64,
}

/// A price entry with its fuel resolved
struct ResolvedPrice {
    record: Record,
    kind: Option<RecordId>,
    price: Option<f64>,
}

impl ReferenceData {
    /// Bundle reference sections
    pub fn new(
        fuels: Arc<Section>,
        fuel_categories: Arc<Section>,
        operators: Arc<Section>,
        options: Arc<Section>,
    ) -> Self {
        Self {
            fuels,
            fuel_categories,
            operators,
            options,
        }
    }

    fn lookup(section: &[Record], id: Option<RecordId>) -> Option<&Record> {
        id.and_then(|id| find_by_id(section, id))
    }

    /// Resolve a price entry's fuel and, through it, the fuel category
    fn resolve_price(&self, entry: &Record) -> ResolvedPrice {
        let mut record = entry.clone();
        let mut kind = None;

        let fuel = Self::lookup(&self.fuels, entry.reference(fields::FUEL_ID)).map(|fuel| {
            let category =
                Self::lookup(&self.fuel_categories, fuel.reference(fields::CATEGORY_ID));
            kind = category.and_then(|c| c.reference(fields::KIND_ID));

            let mut fuel = fuel.clone();
            fuel.attach(fields::CATEGORY, category.cloned().map(Value::from));
            fuel.into_value()
        });
        record.attach(fields::FUEL, fuel);

        ResolvedPrice {
            price: record.number(fields::PRICE),
            record,
            kind,
        }
    }

    /// Attach the operator and resolve every option entry
    fn attach_operator_and_options(&self, station: &mut Record) {
        let operator = Self::lookup(&self.operators, station.reference(fields::OPERATOR_ID));
        station.attach(fields::OPERATOR, operator.cloned().map(Value::from));

        if matches!(station.get(fields::OPTIONS), Some(Value::Array(_))) {
            let options: Vec<Value> = station
                .children(fields::OPTIONS)
                .into_iter()
                .map(|mut entry| {
                    let option =
                        Self::lookup(&self.options, entry.reference(fields::OPTION_ID));
                    entry.attach(fields::OPTION, option.cloned().map(Value::from));
                    entry.into_value()
                })
                .collect();
            station.insert(fields::OPTIONS, options);
        }
    }
}

/// Denormalize one station
///
/// Every price entry gets its `gorivo` (carrying its `vrsta_goriva`), every
/// option entry its `opcija`, and the station its `obveznik`.
pub fn enrich_station(station: &Record, refs: &ReferenceData) -> Record {
    let mut enriched = station.clone();

    if matches!(station.get(fields::PRICES), Some(Value::Array(_))) {
        let prices: Vec<Value> = station
            .children(fields::PRICES)
            .iter()
            .map(|entry| refs.resolve_price(entry).record.into_value())
            .collect();
        enriched.insert(fields::PRICES, prices);
    }

    refs.attach_operator_and_options(&mut enriched);
    enriched
}

/// Stations within range of a point, with their cheapest matching price
///
/// Each retained station carries `udaljenost` (km from the query point),
/// `cjenici` restricted to prices of the requested fuel kind sorted from
/// cheapest, `jeftino` (the cheapest of those, absent when none match) and
/// the same operator and option joins as [`enrich_station`]. Input order is
/// kept. Stations without usable coordinates are dropped.
pub fn filter_stations(stations: &[Record], query: &GeoQuery, refs: &ReferenceData) -> Vec<Record> {
    stations
        .iter()
        .filter_map(|station| rank_station(station, query, refs))
        .collect()
}

fn rank_station(station: &Record, query: &GeoQuery, refs: &ReferenceData) -> Option<Record> {
    let lat = station.number(fields::LAT)?;
    let lon = station.number(fields::LON)?;
    let distance = calculate_distance(query.lat, query.lon, lat, lon);
    if !(distance <= query.max_distance_km) {
        return None;
    }

    let mut matches: Vec<ResolvedPrice> = station
        .children(fields::PRICES)
        .iter()
        .map(|entry| refs.resolve_price(entry))
        .filter(|resolved| resolved.kind == Some(query.fuel_kind))
        .collect();
    matches.sort_by(|a, b| compare_prices(a.price, b.price));

    let mut enriched = station.clone();
    let cheapest = matches.first().map(|m| m.record.clone().into_value());
    let prices: Vec<Value> = matches.into_iter().map(|m| m.record.into_value()).collect();

    enriched.insert(fields::PRICES, prices);
    enriched.attach(fields::CHEAPEST, cheapest);
    enriched.insert(fields::DISTANCE, distance);
    refs.attach_operator_and_options(&mut enriched);

    Some(enriched)
}

/// Ascending by price, unpriced entries last
fn compare_prices(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(value: Value) -> Arc<Section> {
        let Value::Array(items) = value else {
            panic!("expected array");
        };
        Arc::new(
            items
                .into_iter()
                .map(|v| Record::from_value(v).unwrap())
                .collect(),
        )
    }

    fn record(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    /// Petrol is kind 1 (category 10), diesel is kind 2 (category 20)
    fn refs() -> ReferenceData {
        ReferenceData::new(
            section(json!([
                {"id": 1, "naziv": "EUROSUPER 95", "vrsta_goriva_id": 10},
                {"id": 2, "naziv": "EURODIESEL", "vrsta_goriva_id": 20},
                {"id": 3, "naziv": "EUROSUPER 100", "vrsta_goriva_id": 10},
                {"id": 4, "naziv": "ORPHAN", "vrsta_goriva_id": 99},
            ])),
            section(json!([
                {"id": 10, "vrsta_goriva": "benzin", "tip_goriva_id": 1},
                {"id": 20, "vrsta_goriva": "dizel", "tip_goriva_id": 2},
            ])),
            section(json!([{"id": 7, "naziv": "INA"}])),
            section(json!([{"id": 5, "naziv": "Autopraonica"}])),
        )
    }

    fn station(id: i64, lat: f64, lon: f64) -> Record {
        record(json!({
            "id": id,
            "lat": lat,
            "long": lon,
            "obveznik_id": 7,
            "cjenici": [
                {"gorivo_id": 1, "cijena": 1.55},
                {"gorivo_id": 2, "cijena": 1.49},
                {"gorivo_id": 3, "cijena": "1.52"},
                {"gorivo_id": 42, "cijena": 0.10},
            ],
            "opcije": [{"opcija_id": 5}, {"opcija_id": 6}],
        }))
    }

    /// Test enrich station joins
    #[test]
    fn test_enrich_station_joins() {
        let enriched = enrich_station(&station(1, 45.8, 15.9), &refs());

        assert_eq!(enriched.get("obveznik"), Some(&json!({"id": 7, "naziv": "INA"})));

        let prices = enriched.children("cjenici");
        assert_eq!(prices.len(), 4);
        assert_eq!(
            prices[0].get("gorivo"),
            Some(&json!({
                "id": 1,
                "naziv": "EUROSUPER 95",
                "vrsta_goriva_id": 10,
                "vrsta_goriva": {"id": 10, "vrsta_goriva": "benzin", "tip_goriva_id": 1},
            }))
        );
        assert!(prices[3].get("gorivo").is_none());

        let options = enriched.children("opcije");
        assert_eq!(
            options[0].get("opcija"),
            Some(&json!({"id": 5, "naziv": "Autopraonica"}))
        );
        assert!(options[1].get("opcija").is_none());
    }

    /// Test enrich leaves source untouched
    #[test]
    fn test_enrich_leaves_source_untouched() {
        let source = station(1, 45.8, 15.9);
        let before = source.clone();
        let _ = enrich_station(&source, &refs());
        assert_eq!(source, before);
    }

    /// Test enrichment is idempotent
    ///
    /// Enriching an already enriched station must not change it.
    #[test]
    fn test_enrichment_is_idempotent() {
        let refs = refs();
        let once = enrich_station(&station(1, 45.8, 15.9), &refs);
        let twice = enrich_station(&once, &refs);
        assert_eq!(once, twice);
    }

    /// Test unknown operator is absent
    #[test]
    fn test_unknown_operator_is_absent() {
        let mut source = station(1, 45.8, 15.9);
        source.insert("obveznik_id", 999);
        source.insert("obveznik", json!({"id": 999}));

        let enriched = enrich_station(&source, &refs());
        assert!(enriched.get("obveznik").is_none());
    }

    /// Test empty references never fail
    #[test]
    fn test_empty_references_never_fail() {
        let enriched = enrich_station(&station(1, 45.8, 15.9), &ReferenceData::default());
        assert!(enriched.get("obveznik").is_none());
        assert_eq!(enriched.children("cjenici").len(), 4);
    }

    /// Test geofilter keeps only stations in range
    #[test]
    fn test_geofilter_keeps_only_stations_in_range() {
        // 0.018 degrees of latitude is about 2 km, 0.108 about 12 km
        let near = station(1, 45.018, 16.0);
        let far = station(2, 45.108, 16.0);
        let query = GeoQuery {
            lat: 45.0,
            lon: 16.0,
            fuel_kind: RecordId::new(1),
            max_distance_km: 10.0,
        };

        let result = filter_stations(&[far, near], &query, &refs());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id(), Some(RecordId::new(1)));

        let distance = result[0].number("udaljenost").unwrap();
        assert!((distance - 2.0).abs() < 0.1, "got {}", distance);
    }

    /// Test geofilter picks cheapest of kind
    #[test]
    fn test_geofilter_picks_cheapest_of_kind() {
        let query = GeoQuery {
            lat: 45.8,
            lon: 15.9,
            fuel_kind: RecordId::new(1),
            max_distance_km: 5.0,
        };
        let result = filter_stations(&[station(1, 45.8, 15.9)], &query, &refs());

        let cheapest = result[0].get("jeftino").unwrap();
        assert_eq!(cheapest["gorivo_id"], json!(3));
        assert_eq!(cheapest["gorivo"]["naziv"], json!("EUROSUPER 100"));

        let prices = result[0].children("cjenici");
        let ids: Vec<_> = prices.iter().map(|p| p.reference("gorivo_id")).collect();
        assert_eq!(ids, vec![Some(RecordId::new(3)), Some(RecordId::new(1))]);

        assert_eq!(result[0].get("obveznik"), Some(&json!({"id": 7, "naziv": "INA"})));
    }

    /// Test geofilter without matching fuel
    #[test]
    fn test_geofilter_without_matching_fuel() {
        let query = GeoQuery {
            lat: 45.8,
            lon: 15.9,
            fuel_kind: RecordId::new(3),
            max_distance_km: 5.0,
        };
        let result = filter_stations(&[station(1, 45.8, 15.9)], &query, &refs());

        assert_eq!(result.len(), 1);
        assert!(result[0].get("jeftino").is_none());
        assert!(result[0].children("cjenici").is_empty());
    }

    /// Test geofilter keeps input order
    #[test]
    fn test_geofilter_keeps_input_order() {
        let query = GeoQuery {
            lat: 45.0,
            lon: 16.0,
            fuel_kind: RecordId::new(2),
            max_distance_km: 50.0,
        };
        let stations = vec![
            station(1, 45.2, 16.0),
            station(2, 45.01, 16.0),
            station(3, 45.1, 16.0),
        ];
        let ids: Vec<_> = filter_stations(&stations, &query, &refs())
            .iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(
            ids,
            vec![Some(RecordId::new(1)), Some(RecordId::new(2)), Some(RecordId::new(3))]
        );
    }

    /// Test geofilter drops stations without coordinates
    #[test]
    fn test_geofilter_drops_stations_without_coordinates() {
        let mut no_coords = station(1, 0.0, 0.0);
        no_coords.remove("lat");
        let query = GeoQuery {
            lat: 0.0,
            lon: 0.0,
            fuel_kind: RecordId::new(1),
            max_distance_km: 1000.0,
        };
        assert!(filter_stations(&[no_coords], &query, &refs()).is_empty());
    }

    /// Test compare prices
    #[test]
    fn test_compare_prices() {
        assert_eq!(compare_prices(Some(1.0), Some(2.0)), Ordering::Less);
        assert_eq!(compare_prices(None, Some(2.0)), Ordering::Greater);
        assert_eq!(compare_prices(None, None), Ordering::Equal);
    }
}
