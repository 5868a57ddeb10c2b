//! Route handlers
//!
//! Raw sections are served exactly as cached. Enriched and patched views are
//! built from owned copies so the cached records are never modified.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::app::dataset::{find_by_id, RecordId};
use crate::app::enrich::{enrich_station, filter_stations, public_dataset, GeoQuery};
use crate::constants::sections;

/// `GET /`: the whole document, patched, without the hidden tables
pub async fn all_data(State(state): State<AppState>) -> ApiResult<Response> {
    let dataset = state.refresher.dataset().await?;
    Ok(Json(public_dataset(&dataset)).into_response())
}

/// `GET /<section>`: one section as cached
pub async fn raw_section(state: AppState, key: &'static str) -> ApiResult<Response> {
    let section = state.refresher.section(key).await?;
    Ok(Json(section.as_slice()).into_response())
}

/// `GET /postajas/:lat/:lon/:tip/:dist`: enriched stations near a point
pub async fn nearby_stations(
    State(state): State<AppState>,
    Path((lat, lon, tip, dist)): Path<(String, String, String, String)>,
) -> ApiResult<Response> {
    let query = GeoQuery {
        lat: parse_coordinate("lat", &lat)?,
        lon: parse_coordinate("lon", &lon)?,
        fuel_kind: RecordId::from_str(&tip).map_err(|_| ApiError::invalid_parameter("tip", tip))?,
        max_distance_km: parse_coordinate("dist", &dist)?,
    };

    let (stations, refs) = state.refresher.stations_with_references().await?;

    Ok(Json(filter_stations(&stations, &query, &refs)).into_response())
}

/// `GET /:dataType/:id`: one record, enriched when it is a station
pub async fn record_by_id(
    State(state): State<AppState>,
    Path((data_type, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    lookup_record(&state, &data_type, &id).await
}

/// `GET /postajas/:id`: one enriched station
pub async fn station_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    lookup_record(&state, sections::STATIONS, &id).await
}

async fn lookup_record(state: &AppState, data_type: &str, id: &str) -> ApiResult<Response> {
    let item_not_found = || ApiError::ItemNotFound {
        key: data_type.to_string(),
        id: id.to_string(),
    };

    if data_type == sections::STATIONS {
        let (stations, refs) = state.refresher.stations_with_references().await?;
        let record_id = RecordId::from_str(id).map_err(|_| item_not_found())?;
        let station = find_by_id(&stations, record_id).ok_or_else(item_not_found)?;
        return Ok(Json(enrich_station(station, &refs)).into_response());
    }

    let section = state.refresher.section(data_type).await?;
    let record_id = RecordId::from_str(id).map_err(|_| item_not_found())?;
    let record = find_by_id(&section, record_id).ok_or_else(item_not_found)?;
    Ok(Json(record).into_response())
}

fn parse_coordinate(name: &'static str, value: &str) -> ApiResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| ApiError::invalid_parameter(name, value))
}
