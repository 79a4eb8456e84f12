//! GPS devices, their location history and client assignments.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use super::error::{parse_id, ApiResult};
use super::response::ApiResponse;
use super::state::AppState;
use super::ListParams;
use crate::domain::models::{
    AssignRequest, Assignment, Device, DeviceInput, Location, LocationInput, UnassignRequest,
};

#[derive(Debug, Default, Deserialize)]
struct LocationQuery {
    #[serde(default)]
    limit: Option<i64>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/device", get(list_devices).post(create_device))
        .route("/api/device/{id}", get(get_device).put(update_device))
        .route("/api/device/{id}/location", get(list_locations).post(record_location))
        .route("/api/device/{id}/assign", post(assign_device))
        .route("/api/device/{id}/unassign", post(unassign_device))
        .route("/api/device/{id}/assignments", get(list_assignments))
}

async fn list_devices(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Device>>> {
    let Query(params) = query?;
    let (page, filter) = params.into_parts()?;
    let devices = state.devices.list(page, &filter).await?;
    Ok(ApiResponse::page(devices, "Dispositivos"))
}

async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Device>> {
    let device = state.devices.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(device, "Dispositivo"))
}

async fn create_device(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeviceInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Device>> {
    let Json(input) = payload?;
    let device = state.devices.create(input, Utc::now()).await?;
    Ok(ApiResponse::created(device, "Dispositivo creado"))
}

async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<DeviceInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Device>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let device = state.devices.update(id, input, Utc::now()).await?;
    Ok(ApiResponse::ok(device, "Dispositivo actualizado"))
}

async fn record_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<LocationInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Location>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let location = state.devices.record_location(id, input, Utc::now()).await?;
    Ok(ApiResponse::created(location, "Ubicación registrada"))
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Location>>> {
    let id = parse_id(&id)?;
    let Query(query) = query?;
    let locations = state.devices.locations(id, query.limit).await?;
    Ok(ApiResponse::list(locations, "Ubicaciones"))
}

async fn assign_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Assignment>> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let assignment = state.devices.assign(id, request, Utc::now()).await?;
    Ok(ApiResponse::created(assignment, "Dispositivo asignado"))
}

async fn unassign_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Option<Json<UnassignRequest>>, JsonRejection>,
) -> ApiResult<ApiResponse<Assignment>> {
    let id = parse_id(&id)?;
    // No body (no JSON content type) means a plain unassign
    let request = payload?.map(|Json(request)| request).unwrap_or_default();
    let assignment = state.devices.unassign(id, request.returned, Utc::now()).await?;
    Ok(ApiResponse::ok(assignment, "Dispositivo desasignado"))
}

async fn list_assignments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<Assignment>>> {
    let assignments = state.devices.assignments(parse_id(&id)?).await?;
    Ok(ApiResponse::list(assignments, "Asignaciones"))
}
