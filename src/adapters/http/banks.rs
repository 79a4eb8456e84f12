use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Serialize;

use super::error::{parse_id, ApiResult};
use super::response::ApiResponse;
use super::state::AppState;
use super::ListParams;
use crate::domain::models::{Bank, BankInput, NamedRef};

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bank", get(list_banks).post(create_bank))
        .route("/api/bank/simple", get(simple_banks))
        .route("/api/bank/{id}", get(get_bank).put(update_bank).delete(delete_bank))
}

async fn list_banks(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Bank>>> {
    let Query(params) = query?;
    let (page, filter) = params.into_parts()?;
    let banks = state.banks.list(page, &filter).await?;
    Ok(ApiResponse::page(banks, "Bancos"))
}

async fn simple_banks(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<NamedRef>>> {
    let banks = state.banks.simple().await?;
    Ok(ApiResponse::list(banks, "Bancos"))
}

async fn get_bank(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Bank>> {
    let bank = state.banks.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(bank, "Banco"))
}

async fn create_bank(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BankInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Bank>> {
    let Json(input) = payload?;
    let bank = state.banks.create(input, Utc::now()).await?;
    Ok(ApiResponse::created(bank, "Banco creado"))
}

async fn update_bank(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<BankInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Bank>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let bank = state.banks.update(id, input, Utc::now()).await?;
    Ok(ApiResponse::ok(bank, "Banco actualizado"))
}

async fn delete_bank(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Deleted>> {
    state.banks.delete(parse_id(&id)?, Utc::now()).await?;
    Ok(ApiResponse::ok(Deleted { deleted: true }, "Banco eliminado"))
}
