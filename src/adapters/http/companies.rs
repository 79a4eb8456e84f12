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
use crate::domain::models::{Company, CompanyInput, CompanyWithClients, NamedRef};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/company", get(directory).post(list_companies))
        .route("/api/company/create", post(create_company))
        .route(
            "/api/company/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
}

async fn directory(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<NamedRef>>> {
    let companies = state.companies.directory().await?;
    Ok(ApiResponse::list(companies, "Empresas"))
}

async fn list_companies(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ListParams>, JsonRejection>,
) -> ApiResult<ApiResponse<Vec<CompanyWithClients>>> {
    let Json(params) = payload?;
    let (page, filter) = params.into_parts()?;
    let companies = state.companies.list(page, &filter).await?;
    Ok(ApiResponse::page(companies, "Empresas"))
}

async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Company>> {
    let company = state.companies.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(company, "Empresa"))
}

async fn create_company(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CompanyInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Company>> {
    let Json(input) = payload?;
    let company = state.companies.create(input, Utc::now()).await?;
    Ok(ApiResponse::created(company, "Empresa creada"))
}

async fn update_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<CompanyInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Company>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    let company = state.companies.update(id, input, Utc::now()).await?;
    Ok(ApiResponse::ok(company, "Empresa actualizada"))
}

async fn delete_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.companies.delete(parse_id(&id)?, Utc::now()).await?;
    Ok(ApiResponse::ok(true, "Empresa eliminada"))
}
