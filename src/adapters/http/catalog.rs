use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use super::error::{parse_id, ApiResult};
use super::response::ApiResponse;
use super::state::AppState;
use crate::domain::models::{Category, InventoryMovement, Product, ProductInput, StockChange};

#[derive(Debug, Deserialize)]
struct CategoryBody {
    #[serde(default)]
    name: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/category", get(list_categories).post(create_category))
        .route("/api/product", get(list_products).post(create_product))
        .route(
            "/api/product/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/product/{id}/inventory", get(list_movements).post(adjust_stock))
}

async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<Category>>> {
    let categories = state.categories.list().await?;
    Ok(ApiResponse::list(categories, "Categorías"))
}

async fn create_category(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CategoryBody>, JsonRejection>,
) -> ApiResult<ApiResponse<Category>> {
    let Json(body) = payload?;
    let category = state.categories.create(body.name, Utc::now()).await?;
    Ok(ApiResponse::created(category, "Categoría creada"))
}

async fn list_products(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<Vec<Product>>> {
    let products = state.products.list().await?;
    Ok(ApiResponse::list(products, "Productos"))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Product>> {
    let product = state.products.get(parse_id(&id)?).await?;
    Ok(ApiResponse::ok(product, "Producto"))
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<ApiResponse<Product>> {
    let Json(input) = payload?;
    let product = state.products.create(input, Utc::now()).await?;
    Ok(ApiResponse::created(product, "Producto creado"))
}

async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult<ApiResponse<bool>> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    state.products.update(id, input, Utc::now()).await?;
    Ok(ApiResponse::ok(true, "Producto actualizado"))
}

async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.products.delete(parse_id(&id)?, Utc::now()).await?;
    Ok(ApiResponse::ok(true, "Producto eliminado"))
}

async fn list_movements(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<InventoryMovement>>> {
    let movements = state.products.movements(parse_id(&id)?).await?;
    Ok(ApiResponse::list(movements, "Movimientos de inventario"))
}

async fn adjust_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StockChange>, JsonRejection>,
) -> ApiResult<ApiResponse<InventoryMovement>> {
    let id = parse_id(&id)?;
    let Json(change) = payload?;
    let movement = state.products.adjust_stock(id, change, Utc::now()).await?;
    Ok(ApiResponse::created(movement, "Movimiento registrado"))
}
