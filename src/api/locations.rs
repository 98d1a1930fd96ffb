use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use super::access::authenticate;
use super::{ApiError, AppState};
use crate::model::{Location, LocationPatch, NewLocation};

fn not_found() -> ApiError {
    ApiError::NotFound("Location not found".to_string())
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| not_found())
}

pub async fn list_locations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Location>>, ApiError> {
    authenticate(&state, &headers, "/locations")?;
    let locations = state.store()?.list_locations()?;
    Ok(Json(locations))
}

pub async fn create_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: Result<Json<NewLocation>, JsonRejection>,
) -> Result<Json<Location>, ApiError> {
    authenticate(&state, &headers, "/locations")?;
    let Json(new) = req?;
    new.validate().map_err(ApiError::BadRequest)?;
    let location = state.store()?.insert_location(&new)?;
    Ok(Json(location))
}

pub async fn get_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Location>, ApiError> {
    authenticate(&state, &headers, "/locations/{id}")?;
    let id = parse_id(&id)?;
    let location = state.store()?.get_location(id)?;
    location.map(Json).ok_or_else(not_found)
}

pub async fn update_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    req: Result<Json<LocationPatch>, JsonRejection>,
) -> Result<Json<Location>, ApiError> {
    authenticate(&state, &headers, "/locations/{id}")?;
    let id = parse_id(&id)?;
    let Json(patch) = req?;
    let updated = state.store()?.update_location(id, patch)?;
    match updated {
        None => Err(not_found()),
        Some(Err(msg)) => Err(ApiError::BadRequest(msg)),
        Some(Ok(loc)) => Ok(Json(loc)),
    }
}

pub async fn delete_location(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authenticate(&state, &headers, "/locations/{id}")?;
    let id = parse_id(&id)?;
    let deleted = state.store()?.delete_location(id)?;
    if !deleted {
        return Err(not_found());
    }
    Ok(Json(json!({ "message": "Location deleted" })))
}
