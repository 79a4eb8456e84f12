use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;

use super::error::{parse_id, ApiResult};
use super::response::ApiResponse;
use super::state::AppState;
use super::ListParams;
use crate::domain::models::{Client, ClientDetail, ClientInput, ClientWithCompanies};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/client", post(list_clients))
        .route("/api/client/create", post(create_client))
        .route(
            "/api/client/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
}

async fn list_clients(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ListParams>, JsonRejection>,
) -> ApiResult<ApiResponse<Vec<ClientWithCompanies>>> {
    let Json(params) = payload?;
    let (page, filter) = params.into_parts()?;
    let clients = state.clients.list(page, &filter).await?;
    Ok(ApiResponse::page(clients, "Clientes"))
}

async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<ClientDetail>> {
    let client = state.clients.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(client, "Cliente"))
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Client>> {
    let Json(input) = payload?;
    let client = state.clients.create(input, Utc::now()).await?;
    Ok(ApiResponse::created(client, "Cliente creado"))
}

async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> ApiResult<ApiResponse<bool>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    state.clients.update(id, input, Utc::now()).await?;
    Ok(ApiResponse::ok(true, "Cliente actualizado"))
}

async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.clients.delete(parse_id(&id)?, Utc::now()).await?;
    Ok(ApiResponse::ok(true, "Cliente eliminado"))
}
